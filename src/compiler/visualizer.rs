use super::step::{ActionStep, BranchStep, CompiledStep, Condition};
use itertools::Itertools;
use std::fmt;

/// Renders a step sequence as an indented tree for debugging.
pub struct DisplaySteps<'a>(pub &'a [CompiledStep]);

impl fmt::Display for DisplaySteps<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "<no steps>");
        }
        fmt_sequence(self.0, f, "")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Literal { value } => write!(f, "LITERAL({})", value),
            Condition::Always => write!(f, "ALWAYS"),
        }
    }
}

fn fmt_sequence(steps: &[CompiledStep], f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
    if steps.is_empty() {
        return writeln!(f, "{}└── <empty>", prefix);
    }
    for (i, step) in steps.iter().enumerate() {
        let is_last = i + 1 == steps.len();
        let node_marker = if is_last { "└── " } else { "├── " };
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        write!(f, "{}{}", prefix, node_marker)?;
        match step {
            CompiledStep::Action(action) => fmt_action(action, f)?,
            CompiledStep::Branch(branch) => fmt_branch(branch, f, &child_prefix)?,
        }
    }
    Ok(())
}

fn fmt_action(action: &ActionStep, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if action.fields.is_empty() {
        return writeln!(f, "{}", action.step_type);
    }
    let fields = action
        .fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .join(" ");
    writeln!(f, "{} {}", action.step_type, fields)
}

fn fmt_branch(branch: &BranchStep, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
    writeln!(f, "{} {}", branch.step_type, branch.condition)?;

    let nested = format!("{}│   ", prefix);
    writeln!(f, "{}├── then", prefix)?;
    fmt_sequence(&branch.then, f, &nested)?;
    for clause in &branch.else_if {
        writeln!(f, "{}├── else if {}", prefix, clause.condition)?;
        fmt_sequence(&clause.steps, f, &nested)?;
    }
    writeln!(f, "{}└── else", prefix)?;
    fmt_sequence(&branch.otherwise, f, &format!("{}    ", prefix))
}
