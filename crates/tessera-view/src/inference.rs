//! Default template names from controller and action names
//!
//! `app::controller::UserProfileController` with action `showAll` and
//! controller suffix `Controller` maps to `user_profile/show_all`.

/// Derive `{controller}/{action}` from a controller type path and an action
///
/// Only the last segment of `controller` is used; segments may be separated
/// by `::`, `\` or `/`. `controller_suffix` is stripped when present.
pub fn infer_template(controller: &str, action: &str, controller_suffix: &str) -> String {
    let name = last_segment(controller);
    let name = if controller_suffix.is_empty() {
        name
    } else {
        name.strip_suffix(controller_suffix).unwrap_or(name)
    };
    format!("{}/{}", snake_case(name), snake_case(action))
}

/// Derive a template name from the type name of a handler function
///
/// For a handler `crate::controller::user::profile` this yields
/// `user/profile`; for a method `UserController::index` with suffix
/// `Controller` it yields `user/index`. Returns `None` for closures and
/// other anonymous types.
///
/// This relies on [`std::any::type_name`], whose output is not guaranteed
/// to be stable across compiler versions. Prefer explicit template names or
/// [`infer_template`] where correctness matters.
pub fn infer_from_handler<F>(_handler: &F, controller_suffix: &str) -> Option<String> {
    let type_name = std::any::type_name::<F>();
    if type_name.contains("{{closure}}") || type_name.contains('<') {
        return None;
    }

    let mut segments = type_name.rsplit("::");
    let action = segments.next()?;
    let controller = segments.next()?;
    Some(infer_template(controller, action, controller_suffix))
}

fn last_segment(path: &str) -> &str {
    path.rsplit(|c| c == '\\' || c == '/' || c == ':')
        .next()
        .unwrap_or(path)
}

/// Insert `_` before every uppercase letter except the first, then lowercase
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}
