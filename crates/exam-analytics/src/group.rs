//! Subject groups ("khối"): fixed triples of subjects taken together.

use std::{fmt, str::FromStr};

use exam_core::subject::Subject;
use serde::Serialize;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Group {
  A,
  B,
  C,
  D,
}

impl Group {
  pub const ALL: [Group; 4] = [Group::A, Group::B, Group::C, Group::D];

  pub fn subjects(self) -> [Subject; 3] {
    use Subject::*;
    match self {
      Group::A => [Math, Physics, Chemistry],
      Group::B => [Math, Chemistry, Biology],
      Group::C => [Literature, History, Geography],
      Group::D => [Math, Literature, ForeignLanguage],
    }
  }
}

impl fmt::Display for Group {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

impl FromStr for Group {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "A" => Ok(Group::A),
      "B" => Ok(Group::B),
      "C" => Ok(Group::C),
      "D" => Ok(Group::D),
      _ => Err(Error::UnknownGroup(s.to_owned())),
    }
  }
}
