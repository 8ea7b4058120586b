//! Tiered command routing.
//!
//! Every incoming command is assigned a tier before any model call is made.
//! Cheaper tiers are preferred; a tier that cannot complete the command
//! escalates, so routing errs toward the inexpensive side.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::agents::complex::needs_complex_supervisor;
use crate::agents::mini::detect_mini_agent;
use crate::agents::single::is_single_agent_command;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Execution tiers, cheapest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    /// One classification call plus deterministic execution.
    Intent,
    /// A pre-registered pattern handler with a narrow tool set.
    Mini,
    /// A structured-plan supervisor for connected arrangements.
    Complex,
    /// One worker agent with the full tool vocabulary.
    Single,
    /// The full supervisor/worker orchestration loop.
    Orchestrate,
}

/// A routing decision and the rule that produced it.
#[derive(Debug, Clone)]
pub struct Route {
    pub tier: Tier,
    /// Agent name, for tiers bound to a specific handler.
    pub agent: Option<String>,
    pub reason: &'static str,
}

impl Route {
    fn new(tier: Tier, reason: &'static str) -> Self {
        Route {
            tier,
            agent: None,
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule patterns
// ---------------------------------------------------------------------------

static CREATION_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(create|add|make|draw|insert|place|put|generate|build)\b")
        .unwrap()
});

/// Words that signal an explicitly sequenced command.
static SEQUENCING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(then|after that|afterwards|next,|followed by|step \d)\b").unwrap()
});

/// Template vocabulary that expands into many coordinated objects.
static TEMPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(kanban|retrospective|retro board|brainstorm(?:ing)? (?:board|session)|user story map|roadmap)\b")
        .unwrap()
});

static QUANTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,6})\b").unwrap());

/// Commands combining multiple distinct operations ("create ... and connect").
static MULTI_OP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(and (?:then )?(?:connect|delete|move|color|arrange|label)|connect them)\b")
        .unwrap()
});

fn largest_quantity(message: &str) -> Option<u64> {
    QUANTITY
        .captures_iter(message)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .max()
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Route a command to the cheapest tier expected to complete it.
///
/// The rules are ordered; the first match wins. The creation check runs
/// before the pattern-handler and sequencing checks so a narrow
/// "create X with Y color" command is never misrouted to color handling,
/// but connected-structure vocabulary and bulk quantities are carved out
/// first since those commands also start with creation verbs.
pub fn route_command(message: &str, has_selection: bool) -> Route {
    // Commands naming relationships a flat extraction cannot express.
    if needs_complex_supervisor(message) {
        return Route::new(Tier::Complex, "connected-structure vocabulary");
    }

    if largest_quantity(message).is_some_and(|n| n >= 100) {
        return Route::new(Tier::Orchestrate, "bulk quantity");
    }

    // Simple single-operation commands, creation verbs included, resolve
    // with one classification call; misroutes escalate at execution time.
    if CREATION_VERB.is_match(message) || is_single_operation(message) {
        return Route::new(Tier::Intent, "single-operation command");
    }

    if let Some(agent) = detect_mini_agent(message, has_selection) {
        return Route {
            tier: Tier::Mini,
            agent: Some(agent.to_string()),
            reason: "matched a registered pattern handler",
        };
    }

    if SEQUENCING.is_match(message) || MULTI_OP.is_match(message) {
        return Route::new(Tier::Orchestrate, "explicitly sequenced steps");
    }
    if TEMPLATE.is_match(message) {
        return Route::new(Tier::Orchestrate, "template expansion");
    }

    if is_single_agent_command(message) {
        return Route::new(Tier::Single, "one-agent scope");
    }

    Route::new(Tier::Orchestrate, "no cheaper tier matched")
}

/// Whether the command reads as one operation over existing objects.
fn is_single_operation(message: &str) -> bool {
    static SINGLE_OP: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)^\s*(delete|remove|clear|move|shift|resize|rotate|recolor|color|change|update|rename|analyze|count|summarize|arrange|align|organize)\b",
        )
        .unwrap()
    });
    SINGLE_OP.is_match(message) && !SEQUENCING.is_match(message) && !MULTI_OP.is_match(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_verbs_route_to_intent() {
        for cmd in [
            "create 5 red circles",
            "add a sticky note",
            "Make 3 blue squares",
            "delete all circles",
            "move everything left",
        ] {
            assert_eq!(route_command(cmd, false).tier, Tier::Intent, "{cmd}");
        }
    }

    #[test]
    fn test_connected_structures_route_to_complex() {
        assert_eq!(
            route_command("create a cycle of 4 connected nodes", false).tier,
            Tier::Complex
        );
        assert_eq!(
            route_command("build an org hierarchy with 3 levels", false).tier,
            Tier::Complex
        );
    }

    #[test]
    fn test_sequenced_commands_route_to_orchestrate() {
        let route = route_command("label the diagram and then connect everything", false);
        assert_eq!(route.tier, Tier::Orchestrate);
    }

    #[test]
    fn test_creation_verb_wins_over_sequencing_words() {
        // Misroutes escalate dynamically when classification says multi-step.
        let route = route_command("create 3 stickies, then delete the red ones", false);
        assert_eq!(route.tier, Tier::Intent);
    }

    #[test]
    fn test_bulk_quantity_routes_to_orchestrate() {
        assert_eq!(
            route_command("create 100 circles", false).tier,
            Tier::Orchestrate
        );
        // 99 is still a plain creation.
        assert_eq!(
            route_command("create 99 circles", false).tier,
            Tier::Intent
        );
    }

    #[test]
    fn test_template_routes_to_orchestrate() {
        assert_eq!(
            route_command("set up a kanban board for the team", false).tier,
            Tier::Orchestrate
        );
    }

    #[test]
    fn test_mini_agent_binding() {
        let route = route_command("give me a SWOT analysis template", false);
        assert_eq!(route.tier, Tier::Mini);
        assert!(route.agent.is_some());
    }
}
