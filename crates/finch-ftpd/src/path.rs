//! Pure path algebra over POSIX-style paths.
//!
//! `cwd` is bounded by an explicit `max_len` check: a `CWD` argument that
//! would push the working directory past [`CWD_CAPACITY`] is rejected and
//! `cwd` is left unmodified rather than truncated.

/// Maximum length of a working-directory path the session will accept.
pub const CWD_CAPACITY: usize = 255 + 8;

/// Removes the trailing path segment: `up_one("/") == "/"`, and any other
/// path loses everything from (and including) its final `/`.
pub fn up_one(p: &str) -> String {
    if p == "/" {
        return "/".to_string();
    }
    match p.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => p[..i].to_string(),
        None => p.to_string(),
    }
}

/// Applies one `CWD`-style path argument to `cwd` in place: `/` or empty
/// resets to root, `..` pops one segment, a leading `/` replaces `cwd`
/// outright, and anything else is appended as a relative segment. Returns
/// `true` iff the result fits [`CWD_CAPACITY`]; on overflow `cwd` is left
/// unmodified.
pub fn build(cwd: &mut String, arg: &str) -> bool {
    let mut next = if arg == "/" || arg.is_empty() {
        "/".to_string()
    } else if arg == ".." {
        up_one(cwd)
    } else if arg.starts_with('/') {
        arg.to_string()
    } else {
        let mut joined = cwd.clone();
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(arg);
        joined
    };

    if next.len() > 1 && next.ends_with('/') {
        next.pop();
    }

    if next.len() > CWD_CAPACITY {
        return false;
    }

    *cwd = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_one_root_is_fixed_point() {
        assert_eq!(up_one("/"), "/");
    }

    #[test]
    fn up_one_strips_last_segment() {
        assert_eq!(up_one("/a/b/c"), "/a/b");
        assert_eq!(up_one("/a"), "/");
    }

    #[test]
    fn up_one_eventually_reaches_root() {
        let mut p = "/a/b/c/d/e".to_string();
        for _ in 0..10 {
            if p == "/" {
                break;
            }
            p = up_one(&p);
        }
        assert_eq!(p, "/");
    }

    #[test]
    fn build_root_and_empty_reset_to_root() {
        let mut cwd = "/a/b".to_string();
        assert!(build(&mut cwd, "/"));
        assert_eq!(cwd, "/");

        let mut cwd = "/a/b".to_string();
        assert!(build(&mut cwd, ""));
        assert_eq!(cwd, "/");
    }

    #[test]
    fn build_dotdot_goes_up_one() {
        let mut cwd = "/a/b".to_string();
        assert!(build(&mut cwd, ".."));
        assert_eq!(cwd, "/a");
    }

    #[test]
    fn build_absolute_replaces_cwd() {
        let mut cwd = "/a/b".to_string();
        assert!(build(&mut cwd, "/x/y"));
        assert_eq!(cwd, "/x/y");
    }

    #[test]
    fn build_relative_appends() {
        let mut cwd = "/a".to_string();
        assert!(build(&mut cwd, "b"));
        assert_eq!(cwd, "/a/b");

        let mut cwd = "/".to_string();
        assert!(build(&mut cwd, "b"));
        assert_eq!(cwd, "/b");
    }

    #[test]
    fn build_trims_trailing_slash() {
        let mut cwd = "/a".to_string();
        assert!(build(&mut cwd, "b/"));
        assert_eq!(cwd, "/a/b");
    }

    #[test]
    fn build_overflow_makes_no_commit() {
        let mut cwd = "/".to_string();
        let huge = "x".repeat(CWD_CAPACITY + 1);
        assert!(!build(&mut cwd, &huge));
        assert_eq!(cwd, "/");
    }
}
