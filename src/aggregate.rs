//! Response Aggregator：把三份 specialist 回复按 agent 名合并，附带原始 profile 与推导出的 milestones
//!
//! 纯内存操作，无 I/O。按固定键合并，三份回复的到达顺序不影响结果。

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::agents::{
    AgentKind, AgentResponse, Analysis, EmploymentView, IntegrationView, SocialView,
};
use crate::profile::UserProfile;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregateError {
    #[error("No response from the {0} agent")]
    Missing(AgentKind),

    #[error("Duplicate response from the {0} agent")]
    Duplicate(AgentKind),
}

/// 推导出的阶段性目标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub title: String,
    /// 能否与其他 milestone 并行推进
    pub parallel: bool,
    pub to_dos: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<String>,
}

impl Milestone {
    fn new(title: impl Into<String>, parallel: bool, to_dos: Vec<Value>) -> Self {
        Self {
            title: title.into(),
            parallel,
            to_dos,
            optional: Vec::new(),
        }
    }
}

/// 合并结果：构造后不可变，只被 composer 消费一次
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecommendations {
    integration: AgentResponse,
    social: AgentResponse,
    employment: AgentResponse,
    milestones: Vec<Milestone>,
    profile: UserProfile,
}

impl AggregatedRecommendations {
    pub fn response(&self, kind: AgentKind) -> &AgentResponse {
        match kind {
            AgentKind::Integration => &self.integration,
            AgentKind::Social => &self.social,
            AgentKind::Employment => &self.employment,
        }
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }
}

/// 合并三份分析；缺失或重复的 kind 报错
///
/// composer 收到视图截取后的回复，milestones 则从完整回复推导（视图可能去掉了推导所需的根键）。
pub fn aggregate<I>(profile: UserProfile, analyses: I) -> Result<AggregatedRecommendations, AggregateError>
where
    I: IntoIterator<Item = Analysis>,
{
    let mut by_kind = BTreeMap::new();
    for analysis in analyses {
        let kind = analysis.kind;
        if by_kind.insert(kind, analysis).is_some() {
            return Err(AggregateError::Duplicate(kind));
        }
    }

    let mut take = |kind: AgentKind| by_kind.remove(&kind).ok_or(AggregateError::Missing(kind));
    let integration = take(AgentKind::Integration)?;
    let social = take(AgentKind::Social)?;
    let employment = take(AgentKind::Employment)?;

    let milestones = derive_milestones(&integration.parsed, &social.parsed, &employment.parsed);
    tracing::debug!("Derived {} milestones", milestones.len());

    Ok(AggregatedRecommendations {
        integration: integration.response,
        social: social.response,
        employment: employment.response,
        milestones,
        profile,
    })
}

fn strings(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::String(s.to_string())).collect()
}

/// 按 integration → social → employment 的固定顺序推导 milestones
pub fn derive_milestones(
    integration: &AgentResponse,
    social: &AgentResponse,
    employment: &AgentResponse,
) -> Vec<Milestone> {
    let mut milestones = Vec::new();

    if let Some(view) = IntegrationView::from_response(integration.as_value()) {
        if view.language.as_ref().is_some_and(|s| s.present) {
            let mut m = Milestone::new(
                "Sprache & Aufenthalt klären",
                false,
                strings(&[
                    "BAMF-Integrationskurs beantragen",
                    "Beratung bei Migrationsstelle vereinbaren",
                ]),
            );
            m.optional = vec!["Online-Deutschkurs vorbereitend nutzen".to_string()];
            milestones.push(m);
        }
        if let Some(jobcenter) = view.jobcenter.filter(|s| s.present) {
            milestones.push(Milestone::new(
                "Jobcenter & Finanzierung",
                true,
                jobcenter.recommendations,
            ));
        }
        if let Some(financial) = view.financial.filter(|s| s.present) {
            milestones.push(Milestone::new(
                "Finanzielle Unterstützung",
                true,
                financial.recommendations,
            ));
        }
    }

    if let Some(view) = SocialView::from_response(social.as_value()) {
        if let Some(single_parent) = view.single_parent.filter(|s| s.present) {
            let mut to_dos = strings(&["Kitaplatz beantragen", "Wohngeldantrag vorbereiten"]);
            to_dos.extend(single_parent.recommendations);
            milestones.push(Milestone::new("Kinderbetreuung & Wohnen sichern", true, to_dos));
        }
        if let Some(addiction) = view.addiction.filter(|s| s.present) {
            milestones.push(Milestone::new(
                "Gesundheit & Suchtberatung",
                true,
                addiction.recommendations,
            ));
        }
        if let Some(housing) = view.housing.filter(|s| s.present) {
            milestones.push(Milestone::new(
                "Wohnsituation verbessern",
                true,
                housing.recommendations,
            ));
        }
    }

    if let Some(view) = EmploymentView::from_response(employment.as_value()) {
        for opportunity in view.opportunities {
            let mut to_dos = strings(&["AVGS-Coaching starten", "Lebenslauf erstellen mit Coach"]);
            to_dos.extend(opportunity.tasks);
            milestones.push(Milestone::new("Beruflicher Einstieg", false, to_dos));
        }
        for gap in view.skill_gaps {
            milestones.push(Milestone::new(
                format!("Qualifizierung: {}", gap.skill),
                true,
                gap.tasks,
            ));
        }
        if !view.recommendations.is_empty() {
            milestones.push(Milestone::new(
                "Zusätzliche Empfehlungen",
                true,
                view.recommendations,
            ));
        }
    }

    milestones
}
