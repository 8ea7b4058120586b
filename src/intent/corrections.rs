//! Deterministic post-classification correction passes.
//!
//! The completion service is unreliable at bulk enumeration, so known
//! failure modes are repaired after classification by an ordered, pluggable
//! list of passes. Each pass sees the raw command text and may rewrite the
//! intent in place; raw text always wins over the model's output.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::intent::{Intent, Operation};
use crate::types::colors::{resolve_named_color, COLOR_NAME_PATTERN};

/// One correction applied after classification.
pub trait CorrectionPass: Send + Sync + fmt::Debug {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Rewrite the intent in place, consulting the raw command text.
    fn apply(&self, command: &str, intent: &mut Intent);
}

/// The default pass list, in application order.
pub fn default_passes() -> Vec<Box<dyn CorrectionPass>> {
    vec![
        Box::new(MultiStepSafetyOverride),
        Box::new(ColorGroupReconciler),
    ]
}

// ---------------------------------------------------------------------------
// MultiStepSafetyOverride
// ---------------------------------------------------------------------------

static RANDOM_COLORS_CREATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:create|add|make|draw|generate|place)\b.*\b\d+\b.*\b(?:random|different|various|assorted)\s+colors?\b",
    )
    .expect("valid regex")
});

/// Bulk creations with varied colors are single creations with a color
/// cycle, not multi-step plans — the model routinely misclassifies them.
#[derive(Debug)]
pub struct MultiStepSafetyOverride;

impl CorrectionPass for MultiStepSafetyOverride {
    fn name(&self) -> &'static str {
        "multi_step_safety_override"
    }

    fn apply(&self, command: &str, intent: &mut Intent) {
        if !RANDOM_COLORS_CREATE.is_match(command) {
            return;
        }
        if intent.is_multi_step || intent.operation == Operation::MultiStep {
            log::debug!("safety override: forcing single-step create for bulk color command");
        }
        intent.is_multi_step = false;
        intent.steps.clear();
        if intent.operation == Operation::MultiStep {
            intent.operation = Operation::Create;
        }
        if intent.color.is_none() && intent.colors.is_empty() {
            intent.color = Some("random".into());
        }
    }
}

// ---------------------------------------------------------------------------
// ColorGroupReconciler
// ---------------------------------------------------------------------------

static COLOR_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(\d+)\s+({})\b", *COLOR_NAME_PATTERN)).expect("valid regex")
});

/// Extract `<count> <colorName>` groups from raw text.
pub fn parse_color_groups(text: &str) -> Vec<(u32, &'static str)> {
    COLOR_GROUP
        .captures_iter(text)
        .filter_map(|caps| {
            let count: u32 = caps.get(1)?.as_str().parse().ok()?;
            let hex = resolve_named_color(caps.get(2)?.as_str())?;
            Some((count, hex))
        })
        .collect()
}

/// Authoritative color-group parser.
///
/// When the raw text names two or more `<count> <color>` groups ("3 red and
/// 2 blue stickies"), their deterministic expansion replaces whatever color
/// array the model produced, reconciled against the requested quantity.
/// Otherwise a too-short model array is cyclically padded to the quantity.
#[derive(Debug)]
pub struct ColorGroupReconciler;

impl CorrectionPass for ColorGroupReconciler {
    fn name(&self) -> &'static str {
        "color_group_reconciler"
    }

    fn apply(&self, command: &str, intent: &mut Intent) {
        let groups = parse_color_groups(command);
        if groups.len() >= 2 {
            let mut expanded: Vec<String> = groups
                .iter()
                .flat_map(|(count, hex)| {
                    std::iter::repeat_with(|| hex.to_string()).take(*count as usize)
                })
                .collect();
            let total = expanded.len() as u32;

            match intent.quantity {
                Some(q) if q as usize > expanded.len() => {
                    // Pad by cycling the expansion.
                    let cycle: Vec<String> = expanded.clone();
                    let mut i = 0;
                    while expanded.len() < q as usize {
                        expanded.push(cycle[i % cycle.len()].clone());
                        i += 1;
                    }
                }
                Some(q) if (q as usize) < expanded.len() => {
                    log::debug!(
                        "color groups total {total} exceeds quantity {q}; trusting the groups"
                    );
                    intent.quantity = Some(total);
                }
                Some(_) => {}
                None => intent.quantity = Some(total),
            }

            intent.colors = expanded;
            intent.color = None;
            return;
        }

        // Single or no group: only pad a short model array cyclically.
        if let Some(q) = intent.quantity {
            let q = q as usize;
            if !intent.colors.is_empty() && intent.colors.len() < q {
                let cycle = intent.colors.clone();
                let mut i = intent.colors.len();
                while intent.colors.len() < q {
                    intent.colors.push(cycle[i % cycle.len()].clone());
                    i += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_intent(quantity: Option<u32>) -> Intent {
        Intent {
            operation: Operation::Create,
            object_type: Some("sticky".into()),
            quantity,
            ..Default::default()
        }
    }

    #[test]
    fn test_safety_override_forces_single_step() {
        let mut intent = create_intent(Some(10));
        intent.is_multi_step = true;
        intent.operation = Operation::MultiStep;
        intent.steps = vec!["step one".into(), "step two".into()];
        MultiStepSafetyOverride.apply("create 10 stickies with random colors", &mut intent);
        assert!(!intent.is_multi_step);
        assert!(intent.steps.is_empty());
        assert_eq!(intent.operation, Operation::Create);
        assert_eq!(intent.color.as_deref(), Some("random"));
    }

    #[test]
    fn test_safety_override_ignores_other_commands() {
        let mut intent = create_intent(None);
        intent.is_multi_step = true;
        MultiStepSafetyOverride.apply("create a flowchart and then connect it", &mut intent);
        assert!(intent.is_multi_step);
    }

    #[test]
    fn test_color_groups_replace_model_array() {
        let mut intent = create_intent(Some(5));
        intent.colors = vec!["#000000".into()];
        ColorGroupReconciler.apply("add 3 red and 2 blue stickies", &mut intent);
        assert_eq!(
            intent.colors,
            vec!["#EF4444", "#EF4444", "#EF4444", "#3B82F6", "#3B82F6"]
        );
        assert_eq!(intent.quantity, Some(5));
    }

    #[test]
    fn test_color_groups_reconcile_quantity_mismatch() {
        // Groups total 5 but the model said 3: the groups win.
        let mut intent = create_intent(Some(3));
        ColorGroupReconciler.apply("make 3 green and 2 pink shapes", &mut intent);
        assert_eq!(intent.quantity, Some(5));
        assert_eq!(intent.colors.len(), 5);

        // Groups total 4 but quantity is 6: pad by cycling the expansion.
        let mut intent = create_intent(Some(6));
        ColorGroupReconciler.apply("make 2 green and 2 pink shapes", &mut intent);
        assert_eq!(intent.quantity, Some(6));
        assert_eq!(intent.colors.len(), 6);
        assert_eq!(intent.colors[4], intent.colors[0]);
        assert_eq!(intent.colors[5], intent.colors[1]);
    }

    #[test]
    fn test_single_group_only_pads_short_arrays() {
        let mut intent = create_intent(Some(4));
        intent.colors = vec!["#EF4444".into(), "#3B82F6".into()];
        ColorGroupReconciler.apply("create 4 stickies", &mut intent);
        assert_eq!(
            intent.colors,
            vec!["#EF4444", "#3B82F6", "#EF4444", "#3B82F6"]
        );
    }

    #[test]
    fn test_parse_color_groups_resolves_names() {
        let groups = parse_color_groups("2 red, 3 blue and 1 grey");
        assert_eq!(
            groups,
            vec![(2, "#EF4444"), (3, "#3B82F6"), (1, "#6B7280")]
        );
        assert!(parse_color_groups("ten red circles").is_empty());
    }
}
