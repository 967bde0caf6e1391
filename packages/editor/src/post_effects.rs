//! # Post-Effect System
//!
//! Structural intents trigger follow-up changes that keep the rewritten
//! source consistent with how the page renders it.
//!
//! ## Design
//!
//! A post-effect runs once per affected parent after its intent has been
//! applied to the working copy. The only effect today regenerates the
//! `key` attribute of every element child, so the framework remounts the
//! reordered siblings instead of reusing stale component state.
//!
//! Post-effects are:
//! - **Deterministic**: the same intent, parent and id source produce the same result
//! - **Local**: they only touch the parent they are given

use tandem_parser::ast::{Child, Element};
use tandem_semantics::{EditIntent, IdSource, KEY_ATTRIBUTE};

/// Post-effect run against a parent whose child list an intent touched
pub trait PostEffect: std::fmt::Debug {
    fn apply(&self, intent: &EditIntent, parent: &mut Element, ids: &mut dyn IdSource);
}

/// Give every element child of a structurally edited parent a fresh `key`
#[derive(Debug)]
pub struct RegenerateSiblingKeys;

impl PostEffect for RegenerateSiblingKeys {
    fn apply(&self, intent: &EditIntent, parent: &mut Element, ids: &mut dyn IdSource) {
        if !intent.is_structural() {
            return;
        }
        for child in parent.children.iter_mut() {
            if let Child::Element(el) = child {
                if el.is_fragment() {
                    continue;
                }
                el.set_attribute(KEY_ATTRIBUTE, ids.next_key());
            }
        }
    }
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(RegenerateSiblingKeys)],
        }
    }

    /// Engine with no effects registered
    pub fn empty() -> Self {
        Self { effects: vec![] }
    }

    pub fn with_effect(mut self, effect: Box<dyn PostEffect>) -> Self {
        self.effects.push(effect);
        self
    }

    /// Run every effect against one affected parent
    pub fn run(&self, intent: &EditIntent, parent: &mut Element, ids: &mut dyn IdSource) {
        for effect in &self.effects {
            effect.apply(intent, parent, ids);
        }
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_parser::{parse, serialize_element};
    use tandem_semantics::SequentialIds;

    #[test]
    fn test_post_effect_engine_creation() {
        let engine = PostEffectEngine::new();
        assert_eq!(engine.effects.len(), 1);
        assert!(PostEffectEngine::empty().effects.is_empty());
    }

    #[test]
    fn test_keys_regenerated_for_structural_intents() {
        let doc = parse(r#"const a = <ul data-oid="u"><li key="old" />text<li /><></></ul>;"#).unwrap();
        let mut parent = doc.elements()[0].clone();
        let mut ids = SequentialIds::from_seed("k");

        let intent = EditIntent::Remove {
            oid: "x".to_string(),
        };
        PostEffectEngine::new().run(&intent, &mut parent, &mut ids);

        assert_eq!(
            serialize_element(&parent),
            r#"<ul data-oid="u"><li key="tk-k-1" />text<li key="tk-k-2" /><></></ul>"#
        );
    }

    #[test]
    fn test_non_structural_intents_leave_keys() {
        let doc = parse(r#"const a = <ul><li key="old" /></ul>;"#).unwrap();
        let mut parent = doc.elements()[0].clone();
        let mut ids = SequentialIds::from_seed("k");

        let intent = EditIntent::UpdateText {
            oid: "x".to_string(),
            text: "hi".to_string(),
        };
        PostEffectEngine::new().run(&intent, &mut parent, &mut ids);

        assert_eq!(parent.element_children().next().unwrap().get_attribute("key"), Some("old"));
    }
}
