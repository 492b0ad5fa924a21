use eduplan_core::Aggregate;

/// Run `command` against `aggregate` in memory and apply what it decided.
///
/// Nothing is applied when `handle` rejects the command.
pub fn execute<A: Aggregate>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error> {
    let decided = aggregate.handle(command)?;
    decided.iter().for_each(|event| aggregate.apply(event));
    Ok(decided)
}
