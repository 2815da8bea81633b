use super::PoolTopology;

/// Builds the vdev part of `zpool create <pool> ...`.
///
/// Only one data vdev type is used per pool: disks, else mirrors, else raidz.
/// Spares and log devices follow, in that order.
pub fn compile_vdevs(topo: &PoolTopology) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    if !topo.disks.is_empty() {
        args.extend(topo.disks.iter().flatten().cloned());
    } else if !topo.mirrors.is_empty() {
        push_groups(&mut args, "mirror", &topo.mirrors);
    } else if !topo.raidz.is_empty() {
        push_groups(&mut args, topo.effective_parity().keyword(), &topo.raidz);
    }

    push_named(&mut args, "spare", &topo.spares);
    push_named(&mut args, "log", &topo.logs);
    args
}

fn push_groups(args: &mut Vec<String>, keyword: &str, groups: &[Vec<String>]) {
    for g in groups {
        args.push(keyword.to_string());
        args.extend(g.iter().cloned());
    }
}

fn push_named(args: &mut Vec<String>, keyword: &str, devices: &[String]) {
    if devices.is_empty() {
        return;
    }
    args.push(keyword.to_string());
    args.extend(devices.iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{PoolState, RaidParity, parse_status_tokens};

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn disks_have_no_keyword() {
        let mut t = PoolTopology::new("tank");
        t.disks = vec![v(&["A", "B"])];
        assert_eq!(compile_vdevs(&t), v(&["A", "B"]));
    }

    #[test]
    fn mirrors_repeat_keyword() {
        let mut t = PoolTopology::new("tank");
        t.mirrors = vec![v(&["A", "B"]), v(&["C", "D"])];
        assert_eq!(
            compile_vdevs(&t),
            v(&["mirror", "A", "B", "mirror", "C", "D"])
        );
    }

    #[test]
    fn raidz_parity_keyword() {
        let mut t = PoolTopology::new("tank");
        t.raidz = vec![v(&["A", "B", "C"])];
        assert_eq!(compile_vdevs(&t), v(&["raidz1", "A", "B", "C"]));

        t.raid_parity = Some(RaidParity::Double);
        assert_eq!(compile_vdevs(&t), v(&["raidz2", "A", "B", "C"]));
    }

    #[test]
    fn spare_then_log_appended() {
        let mut t = PoolTopology::new("tank");
        t.mirrors = vec![v(&["A", "B"])];
        t.spares = v(&["E"]);
        t.logs = v(&["F"]);
        assert_eq!(
            compile_vdevs(&t),
            v(&["mirror", "A", "B", "spare", "E", "log", "F"])
        );
    }

    #[test]
    fn highest_priority_type_wins() {
        let mut t = PoolTopology::new("tank");
        t.disks = vec![v(&["A"])];
        t.mirrors = vec![v(&["B", "C"])];
        t.raidz = vec![v(&["D", "E", "F"])];
        assert_eq!(compile_vdevs(&t), v(&["A"]));

        t.disks.clear();
        assert_eq!(compile_vdevs(&t), v(&["mirror", "B", "C"]));
    }

    #[test]
    fn nothing_configured_compiles_to_nothing() {
        assert!(compile_vdevs(&PoolTopology::new("tank")).is_empty());
    }

    /// Mimics what `zpool status -P` lists for a pool created with `args`.
    fn status_tokens_for(args: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        let mut idx = 0;
        for a in args {
            let tok = match a.as_str() {
                "mirror" | "raidz1" | "raidz2" => {
                    idx += 1;
                    format!("{a}-{}", idx - 1)
                }
                "spare" => "spares".to_string(),
                "log" => "logs".to_string(),
                dev if dev.starts_with("/dev/disk/by-id/") => format!("{dev}-part1"),
                dev => format!("{dev}1"),
            };
            out.push(tok);
        }
        out
    }

    fn roundtrip(t: &PoolTopology) -> PoolTopology {
        let tokens = status_tokens_for(&compile_vdevs(t));
        match parse_status_tokens(&t.name, &tokens).unwrap() {
            PoolState::Present(p) => p,
            PoolState::Absent => panic!("expected a present pool"),
        }
    }

    #[test]
    fn create_then_inspect_reproduces_mirrors() {
        let mut t = PoolTopology::new("tank");
        t.mirrors = vec![v(&["/dev/sda", "/dev/sdb"]), v(&["/dev/sdc", "/dev/sdd"])];
        t.spares = v(&["/dev/sde"]);
        t.logs = v(&["/dev/disk/by-id/nvme-log"]);
        assert_eq!(roundtrip(&t), t);
    }

    #[test]
    fn create_then_inspect_reproduces_raidz2() {
        let mut t = PoolTopology::new("tank");
        t.raidz = vec![
            v(&["/dev/sda", "/dev/sdb", "/dev/sdc", "/dev/sdd"]),
            v(&["/dev/sde", "/dev/sdf", "/dev/sdg", "/dev/sdh"]),
        ];
        t.raid_parity = Some(RaidParity::Double);
        assert_eq!(roundtrip(&t), t);
    }

    #[test]
    fn create_then_inspect_reproduces_disks() {
        let mut t = PoolTopology::new("tank");
        t.disks = vec![v(&["/dev/sda", "/dev/sdb"])];
        t.spares = v(&["/dev/sdc"]);
        assert_eq!(roundtrip(&t), t);
    }
}
