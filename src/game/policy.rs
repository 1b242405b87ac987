use crate::types::{Assignment, RoundConfig, Role};
use serde::Serialize;

pub const WORD_LABEL: &str = "Your word";
pub const IMPOSTOR_LABEL: &str = "You are the impostor";

/// What a reveal card shows for one assignment
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenderPolicy {
    pub label: &'static str,
    pub show_word: bool,
    pub show_hint_control: bool,
}

/// Decide how a reveal card renders.
///
/// An impostor holding a decoy sees exactly what a word-holder sees, so the
/// card gives nothing away. Any other impostor is told their role. The hint
/// is only on offer when decoys are switched off for the round.
pub fn render_policy(assignment: &Assignment, config: &RoundConfig) -> RenderPolicy {
    let has_decoy = config.give_impostor_fake_word && assignment.visible_word.is_some();

    match assignment.role {
        Role::Impostor if !has_decoy => RenderPolicy {
            label: IMPOSTOR_LABEL,
            show_word: false,
            show_hint_control: !config.give_impostor_fake_word,
        },
        Role::Word | Role::Impostor => RenderPolicy {
            label: WORD_LABEL,
            show_word: true,
            show_hint_control: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(role: Role, visible_word: Option<&str>) -> Assignment {
        Assignment {
            player_index: 0,
            role,
            visible_word: visible_word.map(str::to_string),
            hint: "hint".to_string(),
        }
    }

    fn config(give_impostor_fake_word: bool) -> RoundConfig {
        RoundConfig {
            give_impostor_fake_word,
            ..RoundConfig::default()
        }
    }

    #[test]
    fn test_word_holder_never_gets_hint() {
        for fake in [true, false] {
            let policy = render_policy(&assignment(Role::Word, Some("pancakes")), &config(fake));
            assert_eq!(policy.label, WORD_LABEL);
            assert!(policy.show_word);
            assert!(!policy.show_hint_control);
        }
    }

    #[test]
    fn test_impostor_with_decoy_matches_word_holder() {
        let impostor = render_policy(&assignment(Role::Impostor, Some("waffles")), &config(true));
        let holder = render_policy(&assignment(Role::Word, Some("pancakes")), &config(true));
        assert_eq!(impostor, holder);
    }

    #[test]
    fn test_impostor_without_decoy_gets_hint_control() {
        let policy = render_policy(&assignment(Role::Impostor, None), &config(false));
        assert_eq!(policy.label, IMPOSTOR_LABEL);
        assert!(!policy.show_word);
        assert!(policy.show_hint_control);
    }

    #[test]
    fn test_missing_decoy_keeps_hint_hidden() {
        // Decoy requested but generation produced none
        let policy = render_policy(&assignment(Role::Impostor, None), &config(true));
        assert_eq!(policy.label, IMPOSTOR_LABEL);
        assert!(!policy.show_word);
        assert!(!policy.show_hint_control);
    }
}
