//! Project path helpers
//!
//! Documents reference each other (templates, style sheets) with project paths:
//! `/`-separated strings rooted at the project root, e.g. `/ui/menus/main.uxml`.
//! References written to markup are either absolute (`/ui/card.uxml`) or
//! relative to the file that contains them (`../card.uxml`).

use crate::error::CommonError;
use crate::error::CommonResult;

/// Normalize a project path: collapse `.` and `..`, drop empty segments, force a leading `/`
pub fn normalize(path: &str) -> CommonResult<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(CommonError::PathEscapesRoot {
                        path: path.to_string(),
                    });
                }
            }
            other => segments.push(other),
        }
    }
    Ok(format!("/{}", segments.join("/")))
}

/// Resolve a reference found inside `base_file` to a normalized project path
pub fn resolve_reference(base_file: &str, reference: &str) -> CommonResult<String> {
    if reference.starts_with('/') {
        return normalize(reference);
    }

    let dir = match base_file.rfind('/') {
        Some(idx) => &base_file[..idx],
        None => "",
    };
    normalize(&format!("{}/{}", dir, reference))
}

/// Express `target` as seen from the file `destination`.
///
/// Relative when both live under a shared top-level directory, otherwise the
/// absolute project path. Unnormalizable inputs are returned untouched.
pub fn relative_reference(destination: &str, target: &str) -> String {
    let (Ok(destination), Ok(normalized_target)) = (normalize(destination), normalize(target))
    else {
        return target.to_string();
    };

    let dest_dirs: Vec<&str> = {
        let mut parts: Vec<&str> = destination.split('/').filter(|s| !s.is_empty()).collect();
        parts.pop();
        parts
    };
    let target_parts: Vec<&str> = normalized_target
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let Some((file_name, target_dirs)) = target_parts.split_last() else {
        return normalized_target;
    };

    let common = dest_dirs
        .iter()
        .zip(target_dirs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 {
        return normalized_target;
    }

    let mut parts: Vec<&str> = Vec::new();
    for _ in common..dest_dirs.len() {
        parts.push("..");
    }
    parts.extend(&target_dirs[common..]);
    parts.push(file_name);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(normalize("ui/./menus/../card.uxml").unwrap(), "/ui/card.uxml");
        assert_eq!(normalize("//ui//card.uxml").unwrap(), "/ui/card.uxml");
        assert!(matches!(
            normalize("/../card.uxml"),
            Err(CommonError::PathEscapesRoot { .. })
        ));
    }

    #[test]
    fn test_resolve_relative_and_absolute_references() {
        assert_eq!(
            resolve_reference("/ui/menus/main.uxml", "../common/card.uxml").unwrap(),
            "/ui/common/card.uxml"
        );
        assert_eq!(
            resolve_reference("/ui/menus/main.uxml", "card.uxml").unwrap(),
            "/ui/menus/card.uxml"
        );
        assert_eq!(
            resolve_reference("/ui/menus/main.uxml", "/shared/card.uxml").unwrap(),
            "/shared/card.uxml"
        );
    }

    #[test]
    fn test_relative_reference_with_shared_ancestor() {
        assert_eq!(
            relative_reference("/ui/menus/main.uxml", "/ui/common/card.uxml"),
            "../common/card.uxml"
        );
        assert_eq!(
            relative_reference("/ui/main.uxml", "/ui/card.uxml"),
            "card.uxml"
        );
    }

    #[test]
    fn test_relative_reference_without_shared_ancestor_is_absolute() {
        assert_eq!(
            relative_reference("/ui/main.uxml", "/packages/kit/card.uxml"),
            "/packages/kit/card.uxml"
        );
        assert_eq!(relative_reference("/main.uxml", "/card.uxml"), "/card.uxml");
    }

    #[test]
    fn test_relative_then_resolve_round_trips() {
        let dest = "/ui/screens/inventory/main.uxml";
        let target = "/ui/widgets/slot.uxml";
        let relative = relative_reference(dest, target);
        assert_eq!(resolve_reference(dest, &relative).unwrap(), target);
    }
}
