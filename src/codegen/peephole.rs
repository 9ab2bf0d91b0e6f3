//! Peephole pass (spec.md §4.3.8): one forward scan over the emitted
//! lines with two-line lookahead, applying three rewrites. Idempotent —
//! running it twice must produce the same output as running it once.

/// A self-move, always useless regardless of what register it names.
fn is_self_move(line: &str) -> bool {
    let Some(rest) = line.trim().strip_prefix("mv ") else { return false };
    let mut parts = rest.split(',').map(str::trim);
    match (parts.next(), parts.next()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn jump_target(line: &str) -> Option<&str> {
    line.trim().strip_prefix("j ").map(str::trim)
}

fn label_name(line: &str) -> Option<&str> {
    line.trim().strip_suffix(':')
}

/// Parses `sw R, o(b)` / `lw R, o(b)` into `(reg, offset_and_base)` so the
/// third rule can compare a load against the store immediately before it.
fn store_or_load_operands<'a>(line: &'a str, mnemonic: &str) -> Option<(&'a str, &'a str)> {
    let rest = line.trim().strip_prefix(mnemonic)?.trim();
    let (reg, addr) = rest.split_once(',')?;
    Some((reg.trim(), addr.trim()))
}

pub(super) fn run(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];

        if is_self_move(line) {
            i += 1;
            continue;
        }

        if let Some(target) = jump_target(line) {
            if let Some(next) = lines.get(i + 1) {
                if label_name(next) == Some(target) {
                    i += 1;
                    continue;
                }
            }
        }

        if let Some(last) = out.last() {
            if let (Some((sw_reg, sw_addr)), Some((lw_reg, lw_addr))) =
                (store_or_load_operands(last, "sw"), store_or_load_operands(line, "lw"))
            {
                if sw_reg == lw_reg && sw_addr == lw_addr {
                    i += 1;
                    continue;
                }
            }
        }

        out.push(line.clone());
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_self_moves() {
        let lines = vec!["mv t0, t0".to_string(), "li a0, 1".to_string()];
        assert_eq!(run(lines), vec!["li a0, 1".to_string()]);
    }

    #[test]
    fn drops_a_jump_immediately_followed_by_its_own_label() {
        let lines = vec!["j end_0".to_string(), "end_0:".to_string(), "ret".to_string()];
        assert_eq!(run(lines), vec!["end_0:".to_string(), "ret".to_string()]);
    }

    #[test]
    fn drops_a_redundant_reload_after_an_identical_store() {
        let lines = vec!["sw a0, -12(fp)".to_string(), "lw a0, -12(fp)".to_string()];
        assert_eq!(run(lines), vec!["sw a0, -12(fp)".to_string()]);
    }

    #[test]
    fn keeps_a_load_from_a_different_offset() {
        let lines = vec!["sw a0, -12(fp)".to_string(), "lw a0, -16(fp)".to_string()];
        assert_eq!(run(lines.clone()), lines);
    }

    #[test]
    fn is_idempotent() {
        let lines = vec![
            "mv t0, t0".to_string(),
            "j end_0".to_string(),
            "end_0:".to_string(),
            "sw a0, -12(fp)".to_string(),
            "lw a0, -12(fp)".to_string(),
            "ret".to_string(),
        ];
        let once = run(lines);
        let twice = run(once.clone());
        assert_eq!(once, twice);
    }
}
