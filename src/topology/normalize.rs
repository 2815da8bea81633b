use std::sync::LazyLock;

use regex::Regex;

static SHORT_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(/dev/[a-z]{3})1$").expect("static regex"));

static BY_ID_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(/dev/disk/by-id/.+)-part1$").expect("static regex"));

/// Strips the first-partition suffix that `zpool` shows for whole-disk vdevs,
/// so `/dev/sda1` and `/dev/disk/by-id/x-part1` compare equal to the disk
/// that was handed to `zpool create`.
pub fn normalize_device(token: &str) -> String {
    if SHORT_PART.is_match(token) {
        return token[..token.len() - 1].to_string();
    }
    if let Some(m) = BY_ID_PART.captures(token).and_then(|c| c.get(1)) {
        return m.as_str().to_string();
    }
    token.to_string()
}
