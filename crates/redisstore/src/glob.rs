//! KEYS 使用的 glob 匹配
//!
//! 支持 `*`、`?`、`[abc]`、`[a-z]`、`[^abc]` / `[!abc]` 以及 `\` 转义，
//! 与 Redis 的 stringmatch 行为一致。未闭合的 `[` 按字面字符处理。

/// 预编译的 glob 模式
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: Vec<u8>,
}

impl GlobPattern {
    pub fn new(pattern: &[u8]) -> Self {
        Self {
            pattern: pattern.to_vec(),
        }
    }

    pub fn matches(&self, text: &[u8]) -> bool {
        glob_match(&self.pattern, text)
    }
}

/// 双指针匹配，遇到失配时回溯到最近的 `*`
fn glob_match(pat: &[u8], txt: &[u8]) -> bool {
    let mut pi = 0;
    let mut ti = 0;
    // (星号之后的模式位置, 星号当前吞到的文本位置)
    let mut star: Option<(usize, usize)> = None;

    while ti < txt.len() {
        if pi < pat.len() {
            let advanced = match pat[pi] {
                b'*' => {
                    star = Some((pi + 1, ti));
                    pi += 1;
                    continue;
                }
                b'?' => Some(pi + 1),
                b'[' => match match_class(pat, pi, txt[ti]) {
                    Some((true, next)) => Some(next),
                    Some((false, _)) => None,
                    None => (txt[ti] == b'[').then_some(pi + 1),
                },
                b'\\' if pi + 1 < pat.len() => (pat[pi + 1] == txt[ti]).then_some(pi + 2),
                c => (c == txt[ti]).then_some(pi + 1),
            };
            if let Some(next) = advanced {
                pi = next;
                ti += 1;
                continue;
            }
        }

        match star {
            Some((star_pi, star_ti)) => {
                pi = star_pi;
                ti = star_ti + 1;
                star = Some((star_pi, star_ti + 1));
            }
            None => return false,
        }
    }

    while pi < pat.len() && pat[pi] == b'*' {
        pi += 1;
    }
    pi == pat.len()
}

/// 匹配字符类，返回 (是否命中, `]` 之后的位置)；没有 `]` 时返回 None
fn match_class(pat: &[u8], open: usize, c: u8) -> Option<(bool, usize)> {
    let mut i = open + 1;
    let negated = matches!(pat.get(i), Some(b'^') | Some(b'!'));
    if negated {
        i += 1;
    }

    let mut matched = false;
    while i < pat.len() && pat[i] != b']' {
        if pat[i] == b'\\' && i + 1 < pat.len() {
            i += 1;
        }
        let lo = pat[i];
        if i + 2 < pat.len() && pat[i + 1] == b'-' && pat[i + 2] != b']' {
            let hi = pat[i + 2];
            let (a, b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            matched |= a <= c && c <= b;
            i += 3;
        } else {
            matched |= lo == c;
            i += 1;
        }
    }

    if i >= pat.len() {
        return None;
    }
    Some((matched != negated, i + 1))
}
