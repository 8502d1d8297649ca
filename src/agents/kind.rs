//! AgentKind：三类 specialist 的标识、环境变量名与默认回复模板

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

/// Specialist 类型；聚合时按此键合并，与到达顺序无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Integration,
    Social,
    Employment,
}

impl AgentKind {
    /// 固定顺序（聚合与 milestone 推导都按此顺序）
    pub const ALL: [AgentKind; 3] = [
        AgentKind::Integration,
        AgentKind::Social,
        AgentKind::Employment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AgentKind::Integration => "integration",
            AgentKind::Social => "social",
            AgentKind::Employment => "employment",
        }
    }

    /// 存放 Assistant ID 的环境变量
    pub fn id_env(self) -> &'static str {
        match self {
            AgentKind::Integration => "INTEGRATION_AGENT_ID",
            AgentKind::Social => "SOCIAL_AGENT_ID",
            AgentKind::Employment => "EMPLOYMENT_AGENT_ID",
        }
    }

    /// 内置回复结构：要求 Assistant 按这些类别填写 JSON
    pub fn default_template(self) -> Value {
        match self {
            AgentKind::Integration => json!({
                "integrations_analyse": {
                    "finanzielle_unterstützung": {
                        "bedarf": "",
                        "möglichkeiten": []
                    },
                    "jobcenter_anbindung": {
                        "status": "",
                        "empfehlungen": []
                    },
                    "sprachliche_integration": {
                        "bedarf": "",
                        "kursempfehlungen": []
                    },
                    "zusätzliche_unterstützung": []
                }
            }),
            AgentKind::Social => json!({
                "soziale_analyse": {
                    "alleinerziehend": {
                        "situation": "",
                        "empfehlungen": []
                    },
                    "drogenabhängigkeit": {
                        "situation": "",
                        "empfehlungen": []
                    },
                    "wohnverhältnisse": {
                        "situation": "",
                        "empfehlungen": []
                    },
                    "zusätzliche_unterstützung": []
                }
            }),
            AgentKind::Employment => json!({
                "analysis": {
                    "employment_opportunities": [],
                    "skill_gaps": [],
                    "recommendations": []
                }
            }),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(AgentKind::Social).unwrap(), json!("social"));
        assert_eq!(AgentKind::Employment.to_string(), "employment");
    }

    #[test]
    fn test_default_templates_have_single_root() {
        for kind in AgentKind::ALL {
            let template = kind.default_template();
            assert_eq!(template.as_object().map(|o| o.len()), Some(1), "{kind}");
        }
    }
}
