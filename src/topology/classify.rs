use super::{RaidParity, parser::ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Spares,
    Logs,
    Mirror,
    Raidz(RaidParity),
}

/// Recognizes the vdev group markers in a status listing.
///
/// `Ok(None)` means the token is a plain device (or anything else that is not
/// a marker). Markers this tool cannot represent are errors.
pub fn classify(token: &str) -> Result<Option<GroupKind>, ParseError> {
    match token {
        "spares" => return Ok(Some(GroupKind::Spares)),
        "logs" => return Ok(Some(GroupKind::Logs)),
        _ => {}
    }
    if token.starts_with("mirror") {
        return Ok(Some(GroupKind::Mirror));
    }
    let Some(rest) = token.strip_prefix("raidz") else {
        return Ok(None);
    };
    if rest.starts_with('2') {
        Ok(Some(GroupKind::Raidz(RaidParity::Double)))
    } else if rest.is_empty() || rest.starts_with('1') || rest.starts_with('-') {
        Ok(Some(GroupKind::Raidz(RaidParity::Single)))
    } else {
        Err(ParseError::UnsupportedGroup(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_keywords() {
        assert_eq!(classify("spares").unwrap(), Some(GroupKind::Spares));
        assert_eq!(classify("logs").unwrap(), Some(GroupKind::Logs));
        assert_eq!(classify("spare").unwrap(), None);
        assert_eq!(classify("Logs").unwrap(), None);
    }

    #[test]
    fn mirror_prefix() {
        assert_eq!(classify("mirror-0").unwrap(), Some(GroupKind::Mirror));
        assert_eq!(classify("mirror").unwrap(), Some(GroupKind::Mirror));
        assert_eq!(classify("MIRROR-0").unwrap(), None);
    }

    #[test]
    fn raidz_parity() {
        assert_eq!(
            classify("raidz1-0").unwrap(),
            Some(GroupKind::Raidz(RaidParity::Single))
        );
        assert_eq!(
            classify("raidz-3").unwrap(),
            Some(GroupKind::Raidz(RaidParity::Single))
        );
        assert_eq!(
            classify("raidz2-1").unwrap(),
            Some(GroupKind::Raidz(RaidParity::Double))
        );
    }

    #[test]
    fn unsupported_parity_is_error() {
        let err = classify("raidz3-0").unwrap_err();
        assert!(err.to_string().contains("raidz3-0"), "err was: {err}");
    }

    #[test]
    fn devices_are_not_markers() {
        assert_eq!(classify("/dev/sda").unwrap(), None);
        assert_eq!(classify("/dev/disk/by-id/mirror-x").unwrap(), None);
    }
}
