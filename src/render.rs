use poet_core::Monitor;

/// Serializes the live frontier graph as Graphviz DOT text. States carry
/// their cut and verdict; edges carry the event that produced them.
pub(crate) fn dot(monitor: &Monitor) -> String {
    let root = monitor.property().root();
    let mut out = String::from("digraph frontiers {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"monospace\"];\n");
    for (id, frontier) in monitor.frontiers() {
        let verdict = if frontier.holds(root) { "TRUE" } else { "FALSE" };
        out.push_str(&format!(
            "  s{id} [label=\"S{id}\\n{}\\n{verdict}\"];\n",
            frontier.cut()
        ));
        for &(event, child) in frontier.children() {
            out.push_str(&format!(
                "  s{id} -> s{child} [label=\"{}\"];\n",
                monitor.event(event).id()
            ));
        }
    }
    out.push_str("}\n");
    out
}
