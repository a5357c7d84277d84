//! Link hardening against reverse tabnabbing.
//!
//! Every anchor that opens a new tab must carry `rel="noopener noreferrer"`
//! so the opened page gets no handle on its opener.

use std::sync::Arc;

use common::ShieldResult;

use crate::environment::PageEnvironment;

/// Tokens every new-tab anchor must carry.
pub const REQUIRED_REL_TOKENS: [&str; 2] = ["noopener", "noreferrer"];

/// Work out the hardened `rel` for an anchor.
///
/// Returns `None` when `rel` already holds both tokens exactly once.
/// Existing tokens keep their order; repeated tokens collapse to the
/// first occurrence. Token comparison ignores ASCII case.
pub fn harden_rel(rel: Option<&str>) -> Option<String> {
    let Some(rel) = rel else {
        return Some(REQUIRED_REL_TOKENS.join(" "));
    };

    let mut changed = false;
    let mut tokens: Vec<&str> = Vec::new();
    for token in rel.split_ascii_whitespace() {
        if tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
            changed = true;
        } else {
            tokens.push(token);
        }
    }

    for required in REQUIRED_REL_TOKENS {
        if !tokens.iter().any(|t| t.eq_ignore_ascii_case(required)) {
            tokens.push(required);
            changed = true;
        }
    }

    changed.then(|| tokens.join(" "))
}

/// Make sure every new-tab anchor has a safe `rel`.
///
/// Idempotent: a second run over an unchanged page writes nothing.
/// Returns the number of anchors rewritten.
pub fn secure_external_links(env: &mut dyn PageEnvironment) -> usize {
    let mut rewritten = 0;
    for anchor in env.query_anchors() {
        let rel = env.attribute(anchor, "rel");
        if let Some(hardened) = harden_rel(rel.as_deref()) {
            env.set_attribute(anchor, "rel", &hardened);
            rewritten += 1;
        }
    }

    if rewritten > 0 {
        tracing::debug!(rewritten, "hardened new-tab links");
    }
    rewritten
}

/// Harden links once the document has loaded, and again after every batch
/// of child-list changes under the body.
pub fn install_link_hardener(env: &mut dyn PageEnvironment) -> ShieldResult<()> {
    env.on_content_loaded(Arc::new(|env, _| {
        secure_external_links(env);
    }));
    env.observe_subtree_mutations(Arc::new(|env, _| {
        secure_external_links(env);
    }))?;
    tracing::debug!("link hardener registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEnvironment;
    use web_apis::MutationRecord;

    #[test]
    fn test_missing_rel() {
        assert_eq!(harden_rel(None).as_deref(), Some("noopener noreferrer"));
    }

    #[test]
    fn test_empty_rel() {
        assert_eq!(harden_rel(Some("")).as_deref(), Some("noopener noreferrer"));
        assert_eq!(harden_rel(Some("   ")).as_deref(), Some("noopener noreferrer"));
    }

    #[test]
    fn test_appends_missing_tokens_only() {
        assert_eq!(
            harden_rel(Some("nofollow")).as_deref(),
            Some("nofollow noopener noreferrer")
        );
        assert_eq!(harden_rel(Some("noopener")).as_deref(), Some("noopener noreferrer"));
        assert_eq!(harden_rel(Some("noreferrer")).as_deref(), Some("noreferrer noopener"));
    }

    #[test]
    fn test_already_safe() {
        assert_eq!(harden_rel(Some("noopener noreferrer")), None);
        assert_eq!(harden_rel(Some("NoReferrer external NOOPENER")), None);
    }

    #[test]
    fn test_tokens_not_substrings() {
        assert_eq!(
            harden_rel(Some("noopenerx noreferrer-ish")).as_deref(),
            Some("noopenerx noreferrer-ish noopener noreferrer")
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(
            harden_rel(Some("noopener nofollow noopener NOOPENER")).as_deref(),
            Some("noopener nofollow noreferrer")
        );
        assert_eq!(
            harden_rel(Some("noopener noreferrer noopener")).as_deref(),
            Some("noopener noreferrer")
        );
    }

    #[test]
    fn test_secure_external_links() {
        let mut env = FakeEnvironment::new();
        let bare = env.add_element("a", &[("href", "https://x.test"), ("target", "_blank")]);
        let partial = env.add_element("a", &[("target", "_BLANK"), ("rel", "nofollow noopener")]);
        let same_tab = env.add_element("a", &[("href", "/home")]);
        let framed = env.add_element("a", &[("target", "content")]);

        assert_eq!(secure_external_links(&mut env), 2);
        assert_eq!(env.attribute(bare, "rel").as_deref(), Some("noopener noreferrer"));
        assert_eq!(
            env.attribute(partial, "rel").as_deref(),
            Some("nofollow noopener noreferrer")
        );
        assert_eq!(env.attribute(same_tab, "rel"), None);
        assert_eq!(env.attribute(framed, "rel"), None);
    }

    #[test]
    fn test_idempotent() {
        let mut env = FakeEnvironment::new();
        env.add_element("a", &[("target", "_blank")]);
        env.add_element("a", &[("target", "_blank"), ("rel", "external")]);

        assert_eq!(secure_external_links(&mut env), 2);
        let writes = env.attribute_writes;
        assert_eq!(secure_external_links(&mut env), 0);
        assert_eq!(env.attribute_writes, writes);
    }

    #[test]
    fn test_runs_on_load_and_mutation() {
        let mut env = FakeEnvironment::new();
        install_link_hardener(&mut env).unwrap();
        assert_eq!(env.loaded_handlers.len(), 1);
        assert_eq!(env.mutation_handlers.len(), 1);

        let first = env.add_element("a", &[("target", "_blank")]);
        env.fire_content_loaded();
        assert_eq!(env.attribute(first, "rel").as_deref(), Some("noopener noreferrer"));

        let late = env.add_element("a", &[("target", "_blank"), ("rel", "noreferrer")]);
        let record = MutationRecord::child_list(late).with_added_node(late);
        env.fire_mutations(&[record]);
        assert_eq!(env.attribute(late, "rel").as_deref(), Some("noreferrer noopener"));
    }
}
