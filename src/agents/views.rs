//! 类型化视图：只在 Aggregator 需要读取具体字段（推导 milestones）时构造
//!
//! 视图是宽松的：字段缺失或形状不符时视为空，不报错。空字符串、空数组、false、0 都视为"未填写"。

use serde_json::Value;

/// JSON 值是否"有内容"
pub(crate) fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// 取列表；单个非空值视为一项
pub(crate) fn list(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

/// situation + empfehlungen 形式的小节
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Situation {
    pub present: bool,
    pub recommendations: Vec<Value>,
}

impl Situation {
    fn from_section(section: Option<&Value>, flag: &str, items: &str) -> Option<Self> {
        let section = section?.as_object()?;
        Some(Self {
            present: is_filled(section.get(flag)),
            recommendations: list(section.get(items)),
        })
    }
}

/// integration 回复中的 `integrations_analyse`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationView {
    pub language: Option<Situation>,
    pub jobcenter: Option<Situation>,
    pub financial: Option<Situation>,
}

impl IntegrationView {
    pub fn from_response(value: &Value) -> Option<Self> {
        let root = value.get("integrations_analyse")?;
        Some(Self {
            language: Situation::from_section(
                root.get("sprachliche_integration"),
                "bedarf",
                "kursempfehlungen",
            ),
            jobcenter: Situation::from_section(
                root.get("jobcenter_anbindung"),
                "status",
                "empfehlungen",
            ),
            financial: Situation::from_section(
                root.get("finanzielle_unterstützung"),
                "bedarf",
                "möglichkeiten",
            ),
        })
    }
}

/// social 回复中的 `soziale_analyse`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocialView {
    pub single_parent: Option<Situation>,
    pub addiction: Option<Situation>,
    pub housing: Option<Situation>,
}

impl SocialView {
    pub fn from_response(value: &Value) -> Option<Self> {
        let root = value.get("soziale_analyse")?;
        let section = |key: &str| Situation::from_section(root.get(key), "situation", "empfehlungen");
        Some(Self {
            single_parent: section("alleinerziehend"),
            addiction: section("drogenabhängigkeit"),
            housing: section("wohnverhältnisse"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub tasks: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillGap {
    pub skill: String,
    pub tasks: Vec<Value>,
}

/// employment 回复中的 `analysis`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmploymentView {
    pub opportunities: Vec<Opportunity>,
    pub skill_gaps: Vec<SkillGap>,
    pub recommendations: Vec<Value>,
}

impl EmploymentView {
    pub fn from_response(value: &Value) -> Option<Self> {
        let root = value.get("analysis")?;

        let objects = |key: &str| -> Vec<serde_json::Map<String, Value>> {
            list(root.get(key))
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect()
        };

        let opportunities = objects("employment_opportunities")
            .into_iter()
            .map(|o| Opportunity {
                tasks: list(o.get("tasks")),
            })
            .collect();

        let skill_gaps = objects("skill_gaps")
            .into_iter()
            .map(|g| SkillGap {
                skill: g
                    .get("skill")
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or("Skill Gap")
                    .to_string(),
                tasks: list(g.get("improvement_tasks")),
            })
            .collect();

        Some(Self {
            opportunities,
            skill_gaps,
            recommendations: list(root.get("recommendations")),
        })
    }
}
