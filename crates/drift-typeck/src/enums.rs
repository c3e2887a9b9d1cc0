//! Named-constant tables for enum-kinded command parameters.
//!
//! Default-parse commands accept bare identifiers in enum positions:
//! `GetAV strength`, `Rotate z 30`. The checker tries these tables first,
//! before ordinary identifier resolution; a hit rewrites the argument into
//! a fixed-width numeric literal.

use drift_common::cmd::ParamKind;
use drift_common::fold;
use drift_parser::ast::NumWidth;

/// Resolve a bare identifier against the constant table for a parameter
/// kind. Returns the encoded value and its fixed width.
pub fn resolve(kind: ParamKind, name: &str) -> Option<(u16, NumWidth)> {
    let folded = fold(name);
    let (table, width): (&[(&str, u16)], NumWidth) = match kind {
        ParamKind::ActorValue => (ACTOR_VALUES, NumWidth::Word),
        ParamKind::Axis => (AXES, NumWidth::Byte),
        ParamKind::AnimationGroup => (ANIMATION_GROUPS, NumWidth::Word),
        ParamKind::Sex => (SEXES, NumWidth::Byte),
        ParamKind::CrimeType => (CRIME_TYPES, NumWidth::Byte),
        ParamKind::FormType => (FORM_TYPES, NumWidth::Word),
        ParamKind::Alignment => (ALIGNMENTS, NumWidth::Byte),
        ParamKind::EquipType => (EQUIP_TYPES, NumWidth::Byte),
        ParamKind::CriticalStage => (CRITICAL_STAGES, NumWidth::Byte),
        _ => return None,
    };
    table
        .iter()
        .find(|(entry, _)| *entry == folded)
        .map(|&(_, value)| (value, width))
}

const ACTOR_VALUES: &[(&str, u16)] = &[
    ("aggression", 0),
    ("confidence", 1),
    ("energy", 2),
    ("responsibility", 3),
    ("strength", 4),
    ("perception", 5),
    ("endurance", 6),
    ("charisma", 7),
    ("intelligence", 8),
    ("agility", 9),
    ("luck", 10),
    ("actionpoints", 11),
    ("carryweight", 12),
    ("critchance", 13),
    ("healrate", 14),
    ("health", 15),
    ("meleedamage", 16),
    ("damageresist", 17),
    ("poisonresist", 18),
    ("radresist", 19),
    ("speedmult", 20),
    ("fatigue", 21),
    ("karma", 22),
    ("barter", 23),
    ("bigguns", 24),
    ("energyweapons", 25),
    ("explosives", 26),
    ("lockpick", 27),
    ("medicine", 28),
    ("meleeweapons", 29),
    ("repair", 30),
    ("science", 31),
    ("guns", 32),
    ("sneak", 33),
    ("speech", 34),
    ("survival", 35),
    ("unarmed", 36),
];

/// Axes encode as the letter's character code.
const AXES: &[(&str, u16)] = &[("x", 88), ("y", 89), ("z", 90)];

const ANIMATION_GROUPS: &[(&str, u16)] = &[
    ("idle", 0),
    ("dynamicidle", 1),
    ("specialidle", 2),
    ("forward", 3),
    ("backward", 4),
    ("left", 5),
    ("right", 6),
    ("fastforward", 7),
    ("fastbackward", 8),
    ("fastleft", 9),
    ("fastright", 10),
    ("attackleft", 11),
    ("attackright", 12),
    ("attackpower", 13),
    ("blockidle", 14),
    ("blockhit", 15),
    ("recoil", 16),
    ("stagger", 17),
    ("death", 18),
];

const SEXES: &[(&str, u16)] = &[("male", 0), ("female", 1)];

const CRIME_TYPES: &[(&str, u16)] = &[
    ("theft", 0),
    ("pickpocket", 1),
    ("trespassing", 2),
    ("assault", 3),
    ("murder", 4),
];

const FORM_TYPES: &[(&str, u16)] = &[
    ("armor", 24),
    ("book", 25),
    ("container", 27),
    ("door", 29),
    ("light", 31),
    ("misc", 32),
    ("weapon", 40),
    ("ammo", 41),
    ("npc", 42),
    ("creature", 45),
];

const ALIGNMENTS: &[(&str, u16)] = &[
    ("verygood", 0),
    ("good", 1),
    ("neutral", 2),
    ("evil", 3),
    ("veryevil", 4),
];

const EQUIP_TYPES: &[(&str, u16)] = &[
    ("bigguns", 0),
    ("energyweapons", 1),
    ("guns", 2),
    ("meleeweapons", 3),
    ("unarmed", 4),
    ("thrown", 5),
    ("mine", 6),
];

const CRITICAL_STAGES: &[(&str, u16)] = &[
    ("none", 0),
    ("goostart", 1),
    ("gooend", 2),
    ("disintegratestart", 3),
    ("disintegrateend", 4),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_values_resolve_case_insensitively() {
        assert_eq!(
            resolve(ParamKind::ActorValue, "Strength"),
            Some((4, NumWidth::Word))
        );
        assert_eq!(
            resolve(ParamKind::ActorValue, "GUNS"),
            Some((32, NumWidth::Word))
        );
        assert_eq!(resolve(ParamKind::ActorValue, "bogus"), None);
    }

    #[test]
    fn axes_encode_as_character_codes() {
        assert_eq!(resolve(ParamKind::Axis, "z"), Some((90, NumWidth::Byte)));
        assert_eq!(resolve(ParamKind::Axis, "X"), Some((88, NumWidth::Byte)));
    }

    #[test]
    fn non_enum_kinds_never_resolve() {
        assert_eq!(resolve(ParamKind::Number, "strength"), None);
        assert_eq!(resolve(ParamKind::Quest, "male"), None);
    }

    #[test]
    fn each_enum_kind_has_a_table() {
        assert!(resolve(ParamKind::Sex, "female").is_some());
        assert!(resolve(ParamKind::CrimeType, "murder").is_some());
        assert!(resolve(ParamKind::FormType, "weapon").is_some());
        assert!(resolve(ParamKind::Alignment, "veryevil").is_some());
        assert!(resolve(ParamKind::EquipType, "thrown").is_some());
        assert!(resolve(ParamKind::CriticalStage, "goostart").is_some());
        assert!(resolve(ParamKind::AnimationGroup, "attackpower").is_some());
    }
}
