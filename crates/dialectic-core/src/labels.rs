//! Enum-like labels stored as lowercase snake_case tokens.
//!
//! Some tokens were renamed in schema version 8. Readers keep accepting the
//! old spelling forever: a store can be opened by a build that predates or
//! postdates the rename, and snapshots written by old builds still circulate.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

macro_rules! label {
  (
    $(#[$meta:meta])*
    $name:ident, $field:literal {
      $( $(#[$vmeta:meta])* $variant:ident => $token:literal $(| $legacy:literal)* ),+ $(,)?
    }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum $name {
      $(
        $(#[$vmeta])*
        #[serde(rename = $token $(, alias = $legacy)*)]
        $variant,
      )+
    }

    impl $name {
      /// Every variant, in declaration order.
      pub const ALL: &'static [Self] = &[$(Self::$variant),+];

      /// `(old token, canonical token)` pairs for renamed labels.
      pub const LEGACY: &'static [(&'static str, &'static str)] =
        &[$($(($legacy, $token),)*)+];

      /// The canonical token.
      pub fn as_str(self) -> &'static str {
        match self {
          $(Self::$variant => $token,)+
        }
      }
    }

    impl FromStr for $name {
      type Err = Error;

      fn from_str(s: &str) -> Result<Self, Error> {
        match s {
          $($token $(| $legacy)* => Ok(Self::$variant),)+
          other => Err(Error::UnknownLabel {
            field: $field,
            value: other.to_owned(),
          }),
        }
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }
  };
}

label! {
  /// The angle from which a topic is examined.
  #[derive(Default)]
  Posture, "posture" {
    #[default]
    NeutralCritical => "neutral_critical" | "critical",
    Skeptical => "skeptical" | "skeptic",
    AcademicComparative => "academic_comparative" | "academic",
  }
}

label! {
  /// Which side of its topic a claim argues.
  #[derive(Default)]
  Stance, "stance" {
    Pro => "pro",
    Con => "con",
    #[default]
    Neutral => "neutral",
  }
}

label! {
  /// Author-assessed weight of a claim.
  #[derive(Default)]
  Strength, "strength" {
    Low => "low",
    #[default]
    Medium => "medium",
    High => "high",
  }
}

label! {
  #[derive(Default)]
  EvidenceType, "evidence type" {
    Study => "study",
    Statistic => "statistic" | "data",
    Quote => "quote" | "citation",
    #[default]
    Example => "example" | "anecdote",
  }
}

label! {
  #[derive(Default)]
  Quality, "quality" {
    Low => "low",
    #[default]
    Medium => "medium",
    High => "high",
  }
}

label! {
  /// What a question is trying to achieve.
  #[derive(Default)]
  QuestionKind, "question kind" {
    #[default]
    Socratic => "socratic",
    Clarifying => "clarifying",
    Challenge => "challenge",
    Evidence => "evidence",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_tokens_round_trip() {
    for p in Posture::ALL {
      assert_eq!(p.as_str().parse::<Posture>().unwrap(), *p);
    }
    for t in EvidenceType::ALL {
      assert_eq!(t.to_string().parse::<EvidenceType>().unwrap(), *t);
    }
  }

  #[test]
  fn legacy_tokens_still_parse() {
    assert_eq!("critical".parse::<Posture>().unwrap(), Posture::NeutralCritical);
    assert_eq!("skeptic".parse::<Posture>().unwrap(), Posture::Skeptical);
    assert_eq!("academic".parse::<Posture>().unwrap(), Posture::AcademicComparative);
    assert_eq!("data".parse::<EvidenceType>().unwrap(), EvidenceType::Statistic);
    assert_eq!("anecdote".parse::<EvidenceType>().unwrap(), EvidenceType::Example);
  }

  #[test]
  fn legacy_tokens_deserialize_but_serialize_canonically() {
    let p: Posture = serde_json::from_str("\"academic\"").unwrap();
    assert_eq!(p, Posture::AcademicComparative);
    assert_eq!(serde_json::to_string(&p).unwrap(), "\"academic_comparative\"");
  }

  #[test]
  fn legacy_table_lists_renames() {
    assert!(Posture::LEGACY.contains(&("critical", "neutral_critical")));
    assert!(Stance::LEGACY.is_empty());
  }

  #[test]
  fn unknown_token_is_rejected() {
    let err = "furious".parse::<Posture>().unwrap_err();
    assert!(matches!(err, Error::UnknownLabel { field: "posture", .. }));
  }
}
