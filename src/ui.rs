use prettytable::{Cell, Row, Table};

use crate::{resource::Action, topology::PoolTopology};

pub fn print_pools(pools: &[String]) {
    if pools.is_empty() {
        tracing::info!("<no pools>");
        return;
    }
    let mut table = Table::new();
    table.set_titles(Row::new(vec![Cell::new("Pool")]));
    for p in pools {
        table.add_row(Row::new(vec![Cell::new(p)]));
    }
    table.printstd();
}

pub fn print_topology(topo: &PoolTopology) {
    let mut table = Table::new();
    table.set_titles(Row::new(vec![
        Cell::new("Vdev"),
        Cell::new("Type"),
        Cell::new("Devices"),
    ]));

    for (kind, label, devices) in topology_rows(topo) {
        table.add_row(Row::new(vec![
            Cell::new(&label),
            Cell::new(kind),
            Cell::new(&devices.join("\n")),
        ]));
    }
    tracing::info!("Pool: {}", topo.name);
    table.printstd();
}

pub fn print_plan(pool: &str, actions: &[Action]) {
    if actions.is_empty() {
        tracing::info!("[plan] {pool}: in sync");
        return;
    }
    for a in actions {
        tracing::info!("[plan] {pool}: {a}");
    }
}

fn topology_rows(topo: &PoolTopology) -> Vec<(&'static str, String, &[String])> {
    let mut rows = Vec::new();
    for (i, g) in topo.disks.iter().enumerate() {
        rows.push(("disk", format!("disks-{i}"), g.as_slice()));
    }
    for (i, g) in topo.mirrors.iter().enumerate() {
        rows.push(("mirror", format!("mirror-{i}"), g.as_slice()));
    }
    let parity = topo.effective_parity().keyword();
    for (i, g) in topo.raidz.iter().enumerate() {
        rows.push((parity, format!("{parity}-{i}"), g.as_slice()));
    }
    if !topo.logs.is_empty() {
        rows.push(("log", "logs".to_string(), topo.logs.as_slice()));
    }
    if !topo.spares.is_empty() {
        rows.push(("spare", "spares".to_string(), topo.spares.as_slice()));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::RaidParity;

    #[test]
    fn rows_follow_vdev_order() {
        let mut t = PoolTopology::new("tank");
        t.raidz = vec![vec!["a".into(), "b".into(), "c".into()]];
        t.raid_parity = Some(RaidParity::Double);
        t.logs = vec!["d".into()];
        let rows = topology_rows(&t);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "raidz2");
        assert_eq!(rows[0].1, "raidz2-0");
        assert_eq!(rows[1].1, "logs");
        assert_eq!(rows[1].2, ["d".to_string()]);
    }
}
