use super::{
    PoolState, PoolTopology, RaidParity,
    classify::{GroupKind, classify},
    normalize::normalize_device,
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported vdev group marker '{0}' in zpool status output")]
    UnsupportedGroup(String),

    #[error("vdev group '{0}' has no member devices in zpool status output")]
    EmptyGroup(String),
}

/// Which group owns the run of device tokens currently being collected.
#[derive(Debug, Clone, Copy)]
enum ScanState<'a> {
    /// Leading devices with no marker in front of them: top-level disks.
    BeforeAnyKeyword,
    InsideGroup { kind: GroupKind, marker: &'a str },
}

/// Rebuilds a pool topology from the first word of every vdev-tree line of
/// `zpool status`, pool name already removed.
///
/// A marker token opens a group that owns every following device up to the
/// next marker. Devices before the first marker form one plain disk group.
/// Nesting is not tracked, so a top-level disk listed after a group, or a
/// mirrored log, is attributed to the preceding group.
pub fn parse_status_tokens<S: AsRef<str>>(
    name: &str,
    tokens: &[S],
) -> Result<PoolState, ParseError> {
    if tokens.is_empty() {
        return Ok(PoolState::Absent);
    }

    let mut topo = PoolTopology::new(name);
    let mut state = ScanState::BeforeAnyKeyword;
    let mut run: Vec<String> = Vec::new();

    for tok in tokens {
        let tok = tok.as_ref();
        match classify(tok)? {
            Some(kind) => {
                close_run(&mut topo, state, std::mem::take(&mut run))?;
                state = ScanState::InsideGroup { kind, marker: tok };
            }
            None => run.push(normalize_device(tok)),
        }
    }
    close_run(&mut topo, state, run)?;

    Ok(PoolState::Present(topo))
}

fn close_run(
    topo: &mut PoolTopology,
    state: ScanState<'_>,
    run: Vec<String>,
) -> Result<(), ParseError> {
    let (kind, marker) = match state {
        ScanState::BeforeAnyKeyword => {
            if !run.is_empty() {
                topo.disks.push(run);
            }
            return Ok(());
        }
        ScanState::InsideGroup { kind, marker } => (kind, marker),
    };

    match kind {
        GroupKind::Spares => topo.spares.extend(run),
        GroupKind::Logs => topo.logs.extend(run),
        GroupKind::Mirror | GroupKind::Raidz(_) if run.is_empty() => {
            return Err(ParseError::EmptyGroup(marker.to_string()));
        }
        GroupKind::Mirror => topo.mirrors.push(run),
        GroupKind::Raidz(parity) => {
            topo.raidz.push(run);
            // double parity wins if a pool ever reports both
            if parity == RaidParity::Double || topo.raid_parity.is_none() {
                topo.raid_parity = Some(parity);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Field, FieldValue};

    fn parse(tokens: &[&str]) -> PoolTopology {
        match parse_status_tokens("tank", tokens).unwrap() {
            PoolState::Present(t) => t,
            PoolState::Absent => panic!("expected a present pool"),
        }
    }

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input_is_absent() {
        let st = parse_status_tokens::<&str>("tank", &[]).unwrap();
        assert_eq!(st, PoolState::Absent);
        assert!(!st.exists());
        assert_eq!(st.field(Field::Disk), FieldValue::Absent);
    }

    #[test]
    fn plain_disks_form_one_group() {
        let t = parse(&["/dev/sda1", "/dev/sdb", "/dev/disk/by-id/ata-X-part1"]);
        assert_eq!(t.name, "tank");
        assert_eq!(
            t.disks,
            vec![v(&["/dev/sda", "/dev/sdb", "/dev/disk/by-id/ata-X"])]
        );
        assert!(t.mirrors.is_empty());
        assert!(t.raidz.is_empty());
        assert_eq!(t.raid_parity, None);
    }

    #[test]
    fn single_mirror() {
        let t = parse(&["mirror-0", "/dev/sda1", "/dev/sdb1", "/dev/sdc1"]);
        assert!(t.disks.is_empty());
        assert_eq!(t.mirrors, vec![v(&["/dev/sda", "/dev/sdb", "/dev/sdc"])]);
    }

    #[test]
    fn mirrors_with_spares_and_logs() {
        let t = parse(&[
            "mirror-0", "/dev/sda1", "/dev/sdb1", "mirror-1", "/dev/sdc1", "/dev/sdd1", "logs",
            "/dev/sdf1", "spares", "/dev/sde1", "/dev/sdg1",
        ]);
        assert_eq!(
            t.mirrors,
            vec![v(&["/dev/sda", "/dev/sdb"]), v(&["/dev/sdc", "/dev/sdd"])]
        );
        assert_eq!(t.logs, v(&["/dev/sdf"]));
        assert_eq!(t.spares, v(&["/dev/sde", "/dev/sdg"]));
    }

    #[test]
    fn raidz_parity_levels() {
        let t = parse(&["raidz2-0", "/dev/sda", "/dev/sdb", "/dev/sdc", "/dev/sdd"]);
        assert_eq!(t.raid_parity, Some(RaidParity::Double));
        assert_eq!(t.raidz.len(), 1);
        assert_eq!(t.raidz[0].len(), 4);

        let t = parse(&["raidz1-0", "/dev/sda", "/dev/sdb", "/dev/sdc"]);
        assert_eq!(t.raid_parity, Some(RaidParity::Single));

        let t = parse(&["raidz-0", "/dev/sda", "/dev/sdb", "/dev/sdc"]);
        assert_eq!(t.raid_parity, Some(RaidParity::Single));
    }

    #[test]
    fn mixed_parity_reports_double() {
        let t = parse(&[
            "raidz1-0", "/dev/sda", "/dev/sdb", "raidz2-1", "/dev/sdc", "/dev/sdd", "raidz1-2",
            "/dev/sde", "/dev/sdf",
        ]);
        assert_eq!(t.raidz.len(), 3);
        assert_eq!(t.raid_parity, Some(RaidParity::Double));
    }

    #[test]
    fn leading_disks_then_group() {
        let t = parse(&["/dev/sda", "/dev/sdb", "mirror-1", "/dev/sdc", "/dev/sdd"]);
        assert_eq!(t.disks, vec![v(&["/dev/sda", "/dev/sdb"])]);
        assert_eq!(t.mirrors, vec![v(&["/dev/sdc", "/dev/sdd"])]);
    }

    #[test]
    fn disks_after_a_group_stay_with_the_group() {
        let t = parse(&["mirror-0", "/dev/sda", "/dev/sdb", "/dev/sdc"]);
        assert!(t.disks.is_empty());
        assert_eq!(t.mirrors, vec![v(&["/dev/sda", "/dev/sdb", "/dev/sdc"])]);
    }

    #[test]
    fn disks_with_only_spares() {
        let t = parse(&["/dev/sda", "spares", "/dev/sdb"]);
        assert_eq!(t.disks, vec![v(&["/dev/sda"])]);
        assert_eq!(t.spares, v(&["/dev/sdb"]));
    }

    #[test]
    fn mirrored_log_is_misattributed() {
        let t = parse(&[
            "/dev/sda", "logs", "mirror-1", "/dev/sdb", "/dev/sdc",
        ]);
        assert!(t.logs.is_empty());
        assert_eq!(t.mirrors, vec![v(&["/dev/sdb", "/dev/sdc"])]);
    }

    #[test]
    fn empty_mirror_is_error() {
        let err = parse_status_tokens("tank", &["mirror-0", "logs", "/dev/sda"]).unwrap_err();
        assert_eq!(err, ParseError::EmptyGroup("mirror-0".into()));
    }

    #[test]
    fn raidz3_is_error() {
        let err =
            parse_status_tokens("tank", &["raidz3-0", "/dev/sda", "/dev/sdb"]).unwrap_err();
        assert_eq!(err, ParseError::UnsupportedGroup("raidz3-0".into()));
    }
}
