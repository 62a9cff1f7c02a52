/// Unified-diff line classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
    /// 1-based line number on the old side, if this line exists there
    pub old_line: Option<usize>,
    /// 1-based line number on the new side, if this line exists there
    pub new_line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<Hunk>,
}

const CONTEXT_LINES: usize = 3;
const MERGE_GAP: usize = 6;

fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Computes the Myers shortest edit script between `old` and `new`, grouped
/// into unified hunks with three lines of surrounding context. Adjacent
/// change runs separated by a gap of six edit-script indices or fewer are
/// merged into a single hunk.
///
/// The O(ND) forward trace is kept in full so the edit path can be
/// backtracked afterward, rather than only reporting an edit distance.
pub fn diff(old_path: &str, new_path: &str, old_text: &str, new_text: &str) -> DiffResult {
    let old_lines = split_lines(old_text);
    let new_lines = split_lines(new_text);
    let ops = edit_script(&old_lines, &new_lines);
    let hunks = group_hunks(&ops);
    DiffResult { old_path: old_path.to_owned(), new_path: new_path.to_owned(), hunks }
}

/// One step of the reconstructed path: `(kind, old_idx, new_idx)` where the
/// indices are 0-based positions into `old_lines`/`new_lines` that this step
/// consumes (irrelevant index left at the prior value for the side not
/// consumed).
struct Step {
    kind: LineKind,
    old_idx: usize,
    new_idx: usize,
}

fn edit_script(old_lines: &[&str], new_lines: &[&str]) -> Vec<DiffLine> {
    let n = old_lines.len() as isize;
    let m = new_lines.len() as isize;
    let max = (n + m) as usize;
    let offset = max as isize;

    let mut v = vec![0isize; 2 * max + 1];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    let mut found_d = max as isize;
    'search: for d in 0..=max as isize {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let go_down = k == -d
                || (k != d && v[(offset + k - 1) as usize] < v[(offset + k + 1) as usize]);
            let mut x = if go_down { v[(offset + k + 1) as usize] } else { v[(offset + k - 1) as usize] + 1 };
            let mut y = x - k;
            while x < n && y < m && old_lines[x as usize] == new_lines[y as usize] {
                x += 1;
                y += 1;
            }
            v[(offset + k) as usize] = x;
            if x >= n && y >= m {
                found_d = d;
                break 'search;
            }
            k += 2;
        }
    }

    // backtrack from (n, m) to (0, 0), collecting moves in reverse
    let mut steps: Vec<Step> = Vec::new();
    let mut x = n;
    let mut y = m;
    for d in (0..=found_d).rev() {
        let v = &trace[d as usize];
        let k = x - y;
        let go_down =
            k == -d || (k != d && v[(offset + k - 1) as usize] < v[(offset + k + 1) as usize]);
        let prev_k = if go_down { k + 1 } else { k - 1 };
        let prev_x = v[(offset + prev_k) as usize];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            steps.push(Step { kind: LineKind::Context, old_idx: (x - 1) as usize, new_idx: (y - 1) as usize });
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                steps.push(Step { kind: LineKind::Added, old_idx: prev_x as usize, new_idx: (y - 1) as usize });
            } else {
                steps.push(Step { kind: LineKind::Removed, old_idx: (x - 1) as usize, new_idx: prev_y as usize });
            }
            x = prev_x;
            y = prev_y;
        }
    }
    steps.reverse();

    steps
        .into_iter()
        .map(|step| match step.kind {
            LineKind::Context => DiffLine {
                kind: LineKind::Context,
                text: old_lines[step.old_idx].to_owned(),
                old_line: Some(step.old_idx + 1),
                new_line: Some(step.new_idx + 1),
            },
            LineKind::Removed => DiffLine {
                kind: LineKind::Removed,
                text: old_lines[step.old_idx].to_owned(),
                old_line: Some(step.old_idx + 1),
                new_line: None,
            },
            LineKind::Added => DiffLine {
                kind: LineKind::Added,
                text: new_lines[step.new_idx].to_owned(),
                old_line: None,
                new_line: Some(step.new_idx + 1),
            },
        })
        .collect()
}

fn group_hunks(ops: &[DiffLine]) -> Vec<Hunk> {
    // maximal runs of non-Context ops
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < ops.len() {
        if ops[i].kind != LineKind::Context {
            let start = i;
            while i < ops.len() && ops[i].kind != LineKind::Context {
                i += 1;
            }
            runs.push((start, i)); // half-open
        } else {
            i += 1;
        }
    }
    if runs.is_empty() {
        return Vec::new();
    }

    // merge runs whose separating context gap is <= MERGE_GAP
    let mut merged: Vec<(usize, usize)> = vec![runs[0]];
    for &(start, end) in &runs[1..] {
        let last = merged.last_mut().unwrap();
        if start - last.1 <= MERGE_GAP {
            last.1 = end;
        } else {
            merged.push((start, end));
        }
    }

    merged
        .into_iter()
        .map(|(start, end)| {
            let ctx_start = start.saturating_sub(CONTEXT_LINES);
            let ctx_end = (end + CONTEXT_LINES).min(ops.len());
            build_hunk(&ops[ctx_start..ctx_end])
        })
        .collect()
}

fn build_hunk(lines: &[DiffLine]) -> Hunk {
    let old_start_found = lines.iter().find_map(|l| l.old_line);
    let new_start_found = lines.iter().find_map(|l| l.new_line);
    let old_count = lines.iter().filter(|l| l.kind != LineKind::Added).count();
    let new_count = lines.iter().filter(|l| l.kind != LineKind::Removed).count();

    let new_start = new_start_found.unwrap_or(0);
    let old_start = old_start_found.unwrap_or(0);

    let (old_start, new_start) = match (old_count, new_count) {
        (0, _) => (new_start + 1, new_start),
        (_, 0) => (old_start, old_start + 1),
        _ => (old_start, new_start),
    };

    Hunk { old_start, old_count, new_start, new_count, lines: lines.to_vec() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_no_hunks() {
        let d = diff("a", "a", "x\ny\nz\n", "x\ny\nz\n");
        assert!(d.hunks.is_empty());
    }

    #[test]
    fn empty_to_full_is_all_added() {
        let d = diff("a", "a", "", "one\ntwo\n");
        assert_eq!(d.hunks.len(), 1);
        let hunk = &d.hunks[0];
        assert!(hunk.lines.iter().all(|l| l.kind == LineKind::Added));
        assert_eq!(hunk.old_count, 0);
        assert_eq!(hunk.new_count, 2);
        assert_eq!(hunk.new_start, 1);
        assert_eq!(hunk.old_start, 2);
    }

    #[test]
    fn full_to_empty_is_all_removed() {
        let d = diff("a", "a", "one\ntwo\n", "");
        assert_eq!(d.hunks.len(), 1);
        let hunk = &d.hunks[0];
        assert!(hunk.lines.iter().all(|l| l.kind == LineKind::Removed));
        assert_eq!(hunk.new_count, 0);
        assert_eq!(hunk.old_count, 2);
    }

    #[test]
    fn single_line_change_in_middle_has_context() {
        let old = "a\nb\nc\nd\ne\n";
        let new = "a\nb\nX\nd\ne\n";
        let d = diff("f", "f", old, new);
        assert_eq!(d.hunks.len(), 1);
        let hunk = &d.hunks[0];
        let kinds: Vec<_> = hunk.lines.iter().map(|l| l.kind).collect();
        assert!(kinds.contains(&LineKind::Removed));
        assert!(kinds.contains(&LineKind::Added));
        assert!(kinds.iter().filter(|k| **k == LineKind::Context).count() >= 2);
    }

    #[test]
    fn distant_changes_form_separate_hunks() {
        let mut old_lines = vec!["ctx".to_string(); 40];
        old_lines[0] = "first".into();
        old_lines[39] = "last".into();
        let old = old_lines.join("\n") + "\n";

        let mut new_lines = old_lines.clone();
        new_lines[0] = "FIRST".into();
        new_lines[39] = "LAST".into();
        let new = new_lines.join("\n") + "\n";

        let d = diff("f", "f", &old, &new);
        assert_eq!(d.hunks.len(), 2);
    }

    #[test]
    fn nearby_changes_merge_into_one_hunk() {
        let lines: Vec<String> = (0..20).map(|i| format!("line{i}")).collect();
        let old = lines.join("\n") + "\n";
        let mut changed = lines.clone();
        changed[5] = "CHANGED5".into();
        changed[10] = "CHANGED10".into();
        let new = changed.join("\n") + "\n";

        let d = diff("f", "f", &old, &new);
        assert_eq!(d.hunks.len(), 1);
    }

    #[test]
    fn trailing_cr_is_stripped() {
        let d = diff("a", "a", "one\r\ntwo\r\n", "one\r\ntwo\r\n");
        assert!(d.hunks.is_empty());
    }
}
