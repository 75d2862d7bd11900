//! Priority rules for overlapping shapes of different classes.

use crate::shapes::ClassLabel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome for a pair of overlapping shapes of different classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep the first shape, drop the second.
    KeepFirst,
    /// Keep the second shape, drop the first.
    KeepSecond,
    /// Drop both shapes.
    ExcludeBoth,
}

/// Decides which of two overlapping, differently classified shapes survives.
///
/// Returning `None` means the policy has no rule for the pair; the resolver
/// reports that as an error instead of guessing.
pub trait PriorityPolicy {
    fn verdict(&self, first: Option<&ClassLabel>, second: Option<&ClassLabel>) -> Option<Verdict>;
}

impl<F> PriorityPolicy for F
where
    F: Fn(Option<&ClassLabel>, Option<&ClassLabel>) -> Option<Verdict>,
{
    fn verdict(&self, first: Option<&ClassLabel>, second: Option<&ClassLabel>) -> Option<Verdict> {
        self(first, second)
    }
}

/// Label shown for the exclude option in the priority choice list.
pub const EXCLUDE_BOTH_LABEL: &str = "Exclude both";

/// The single choice offered to the user: exclude both, or prefer one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityChoice {
    ExcludeBoth,
    /// Shapes of `class` win against any other class. Pairs that do not
    /// involve `class` have no rule.
    Prefer { class: Option<ClassLabel> },
    /// Earlier classes beat later ones and any listed class beats an
    /// unlisted one. Two unlisted classes have no rule.
    Ranking { classes: Vec<Option<ClassLabel>> },
}

impl PriorityChoice {
    pub fn prefer(class: impl Into<ClassLabel>) -> Self {
        Self::Prefer {
            class: Some(class.into()),
        }
    }

    /// Ranking from highest to lowest priority. `None` stands for unclassified.
    pub fn ranking<I, C>(classes: I) -> Self
    where
        I: IntoIterator<Item = Option<C>>,
        C: Into<ClassLabel>,
    {
        Self::Ranking {
            classes: classes.into_iter().map(|class| class.map(Into::into)).collect(),
        }
    }

    /// Parse a choice-list label: `"Exclude both"` or a class name.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case(EXCLUDE_BOTH_LABEL) {
            Self::ExcludeBoth
        } else {
            Self::prefer(label.trim())
        }
    }

    /// Labels for a choice list over the given classes.
    pub fn labels<'a>(classes: impl IntoIterator<Item = &'a ClassLabel>) -> Vec<String> {
        std::iter::once(EXCLUDE_BOTH_LABEL.to_string())
            .chain(classes.into_iter().map(ToString::to_string))
            .collect()
    }
}

impl Default for PriorityChoice {
    fn default() -> Self {
        Self::prefer("Positive")
    }
}

impl PriorityPolicy for PriorityChoice {
    fn verdict(&self, first: Option<&ClassLabel>, second: Option<&ClassLabel>) -> Option<Verdict> {
        match self {
            PriorityChoice::ExcludeBoth => Some(Verdict::ExcludeBoth),
            PriorityChoice::Prefer { class } => {
                let preferred = class.as_ref();
                if first == preferred {
                    Some(Verdict::KeepFirst)
                } else if second == preferred {
                    Some(Verdict::KeepSecond)
                } else {
                    None
                }
            }
            PriorityChoice::Ranking { classes } => {
                let rank = |class: Option<&ClassLabel>| {
                    classes.iter().position(|ranked| ranked.as_ref() == class)
                };
                match (rank(first), rank(second)) {
                    (Some(a), Some(b)) if a < b => Some(Verdict::KeepFirst),
                    (Some(a), Some(b)) if a > b => Some(Verdict::KeepSecond),
                    (Some(_), None) => Some(Verdict::KeepFirst),
                    (None, Some(_)) => Some(Verdict::KeepSecond),
                    _ => None,
                }
            }
        }
    }
}

/// Unordered pair of classes.
type ClassPair = (Option<ClassLabel>, Option<ClassLabel>);

fn pair_key(a: Option<&ClassLabel>, b: Option<&ClassLabel>) -> ClassPair {
    if a <= b {
        (a.cloned(), b.cloned())
    } else {
        (b.cloned(), a.cloned())
    }
}

/// Rule stored for a class pair.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PairRule {
    Prefer(Option<ClassLabel>),
    ExcludeBoth,
}

/// Per-pair priority rules for any number of classes.
#[derive(Debug, Clone, Default)]
pub struct PairwisePolicy {
    rules: HashMap<ClassPair, PairRule>,
    fallback: Option<Verdict>,
}

impl PairwisePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `a` and `b` overlap, keep the shape of class `winner`.
    pub fn prefer(
        mut self,
        a: Option<ClassLabel>,
        b: Option<ClassLabel>,
        winner: Option<ClassLabel>,
    ) -> Self {
        self.rules
            .insert(pair_key(a.as_ref(), b.as_ref()), PairRule::Prefer(winner));
        self
    }

    /// When `a` and `b` overlap, drop both.
    pub fn exclude(mut self, a: Option<ClassLabel>, b: Option<ClassLabel>) -> Self {
        self.rules
            .insert(pair_key(a.as_ref(), b.as_ref()), PairRule::ExcludeBoth);
        self
    }

    /// Verdict for pairs without an explicit rule, as seen from the first shape.
    pub fn with_fallback(mut self, verdict: Verdict) -> Self {
        self.fallback = Some(verdict);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl PriorityPolicy for PairwisePolicy {
    fn verdict(&self, first: Option<&ClassLabel>, second: Option<&ClassLabel>) -> Option<Verdict> {
        match self.rules.get(&pair_key(first, second)) {
            Some(PairRule::ExcludeBoth) => Some(Verdict::ExcludeBoth),
            Some(PairRule::Prefer(winner)) if winner.as_ref() == first => Some(Verdict::KeepFirst),
            Some(PairRule::Prefer(winner)) if winner.as_ref() == second => Some(Verdict::KeepSecond),
            Some(PairRule::Prefer(_)) => None,
            None => self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str) -> Option<ClassLabel> {
        Some(ClassLabel::from(name))
    }

    #[test]
    fn test_exclude_both() {
        let choice = PriorityChoice::ExcludeBoth;
        assert_eq!(
            choice.verdict(label("A").as_ref(), label("B").as_ref()),
            Some(Verdict::ExcludeBoth)
        );
    }

    #[test]
    fn test_prefer_class() {
        let choice = PriorityChoice::prefer("Positive");
        let pos = label("Positive");
        let neg = label("Negative");
        assert_eq!(choice.verdict(pos.as_ref(), neg.as_ref()), Some(Verdict::KeepFirst));
        assert_eq!(choice.verdict(neg.as_ref(), pos.as_ref()), Some(Verdict::KeepSecond));
        assert_eq!(choice.verdict(neg.as_ref(), label("Other").as_ref()), None);
    }

    #[test]
    fn test_prefer_unclassified() {
        let choice = PriorityChoice::Prefer { class: None };
        assert_eq!(choice.verdict(label("A").as_ref(), None), Some(Verdict::KeepSecond));
    }

    #[test]
    fn test_ranking() {
        let choice = PriorityChoice::ranking([Some("Tumor"), None, Some("Stroma")]);
        let tumor = label("Tumor");
        let stroma = label("Stroma");
        let immune = label("Immune");

        assert_eq!(choice.verdict(stroma.as_ref(), tumor.as_ref()), Some(Verdict::KeepSecond));
        assert_eq!(choice.verdict(None, stroma.as_ref()), Some(Verdict::KeepFirst));
        assert_eq!(choice.verdict(tumor.as_ref(), None), Some(Verdict::KeepFirst));
        // Unlisted classes lose to any listed one.
        assert_eq!(choice.verdict(immune.as_ref(), stroma.as_ref()), Some(Verdict::KeepSecond));
        assert_eq!(choice.verdict(immune.as_ref(), label("Other").as_ref()), None);
    }

    #[test]
    fn test_ranking_serde() {
        let choice = PriorityChoice::ranking([Some("Tumor"), None]);
        let json = serde_json::to_string(&choice).unwrap();
        assert_eq!(json, r#"{"ranking":{"classes":["Tumor",null]}}"#);
        let back: PriorityChoice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, choice);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(PriorityChoice::from_label("Exclude both"), PriorityChoice::ExcludeBoth);
        assert_eq!(PriorityChoice::from_label(" Negative "), PriorityChoice::prefer("Negative"));
    }

    #[test]
    fn test_labels() {
        let classes = [ClassLabel::from("Positive"), ClassLabel::from("Negative")];
        assert_eq!(
            PriorityChoice::labels(&classes),
            vec!["Exclude both", "Positive", "Negative"]
        );
    }

    #[test]
    fn test_pairwise_is_order_independent() {
        let policy = PairwisePolicy::new()
            .prefer(label("Tumor"), label("Stroma"), label("Tumor"))
            .exclude(label("Stroma"), label("Immune"));

        assert_eq!(
            policy.verdict(label("Stroma").as_ref(), label("Tumor").as_ref()),
            Some(Verdict::KeepSecond)
        );
        assert_eq!(
            policy.verdict(label("Tumor").as_ref(), label("Stroma").as_ref()),
            Some(Verdict::KeepFirst)
        );
        assert_eq!(
            policy.verdict(label("Immune").as_ref(), label("Stroma").as_ref()),
            Some(Verdict::ExcludeBoth)
        );
        assert_eq!(policy.verdict(label("Tumor").as_ref(), label("Immune").as_ref()), None);
        assert_eq!(policy.len(), 2);
    }

    #[test]
    fn test_pairwise_fallback() {
        let policy = PairwisePolicy::new().with_fallback(Verdict::ExcludeBoth);
        assert!(policy.is_empty());
        assert_eq!(
            policy.verdict(label("X").as_ref(), None),
            Some(Verdict::ExcludeBoth)
        );
    }

    #[test]
    fn test_closure_policy() {
        let keep_second = |_: Option<&ClassLabel>, _: Option<&ClassLabel>| Some(Verdict::KeepSecond);
        assert_eq!(keep_second.verdict(None, label("A").as_ref()), Some(Verdict::KeepSecond));
    }

    #[test]
    fn test_choice_serde() {
        let json = serde_json::to_string(&PriorityChoice::prefer("Negative")).unwrap();
        assert_eq!(json, r#"{"prefer":{"class":"Negative"}}"#);
        let back: PriorityChoice = serde_json::from_str(r#""exclude_both""#).unwrap();
        assert_eq!(back, PriorityChoice::ExcludeBoth);
    }
}
