/// ffmpeg argument assertion utilities
#[allow(dead_code)]
pub fn assert_cmd_contains(cmd: &str, fragment: &str) {
    assert!(
        cmd.contains(fragment),
        "Expected ffmpeg command to contain '{}' but it didn't.\nCommand: {}",
        fragment,
        cmd
    );
}

/// Check if a command string does NOT contain a fragment
#[allow(dead_code)]
pub fn assert_cmd_not_contains(cmd: &str, fragment: &str) {
    assert!(
        !cmd.contains(fragment),
        "Expected ffmpeg command to NOT contain '{}' but it did.\nCommand: {}",
        fragment,
        cmd
    );
}

/// Value following `flag` in an argument list (e.g. "17" for "-crf")
#[allow(dead_code)]
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Position of `flag` in an argument list, panicking with the full list when absent
#[allow(dead_code)]
pub fn position_of(args: &[String], flag: &str) -> usize {
    args.iter()
        .position(|a| a == flag)
        .unwrap_or_else(|| panic!("'{}' missing from {:?}", flag, args))
}

/// Assert that the flags occur in this order
#[allow(dead_code)]
pub fn assert_flag_order(args: &[String], flags: &[&str]) {
    let positions: Vec<usize> = flags.iter().map(|f| position_of(args, f)).collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "Expected flags in order {:?}, got positions {:?}\nArgs: {:?}",
        flags,
        positions,
        args
    );
}
