use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "Erkek")]
    Male,
    #[serde(rename = "Kız")]
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Erkek",
            Gender::Female => "Kız",
        }
    }

    /// Strict parse of the stored/wire value. Anything outside the two
    /// locale strings is rejected instead of passed through.
    pub fn parse(raw: &str) -> Option<Gender> {
        match raw {
            "Erkek" => Some(Gender::Male),
            "Kız" => Some(Gender::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three graded activities ("temrin") every student has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assessment {
    First,
    Second,
    Third,
}

impl Assessment {
    /// Ordered lookup table: 1 -> score1, 2 -> score2, 3 -> score3.
    pub const ALL: [Assessment; 3] = [Assessment::First, Assessment::Second, Assessment::Third];

    pub fn index(self) -> usize {
        match self {
            Assessment::First => 0,
            Assessment::Second => 1,
            Assessment::Third => 2,
        }
    }

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn label(self) -> String {
        format!("Temrin {}", self.number())
    }

    /// Wire/storage key of the score field for this assessment.
    pub fn field(self) -> &'static str {
        match self {
            Assessment::First => "score1",
            Assessment::Second => "score2",
            Assessment::Third => "score3",
        }
    }
}

impl Serialize for Assessment {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scores([f64; 3]);

impl Scores {
    pub fn new(score1: f64, score2: f64, score3: f64) -> Self {
        Self([score1, score2, score3])
    }

    pub fn get(&self, a: Assessment) -> f64 {
        self.0[a.index()]
    }

    pub fn set(&mut self, a: Assessment, value: f64) {
        self.0[a.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Assessment, f64)> + '_ {
        Assessment::ALL.iter().map(move |a| (*a, self.get(*a)))
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Unsaved form contents. Has no id and no average.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDraft {
    pub student_no: String,
    pub full_name: String,
    pub gender: Gender,
    pub class_name: String,
    pub scores: Scores,
}

impl Default for StudentDraft {
    fn default() -> Self {
        Self {
            student_no: String::new(),
            full_name: String::new(),
            gender: Gender::Male,
            class_name: String::new(),
            scores: Scores::default(),
        }
    }
}

impl Serialize for StudentDraft {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut st = s.serialize_struct("StudentDraft", 7)?;
        st.serialize_field("studentNo", &self.student_no)?;
        st.serialize_field("fullName", &self.full_name)?;
        st.serialize_field("gender", &self.gender)?;
        st.serialize_field("className", &self.class_name)?;
        for (a, v) in self.scores.iter() {
            st.serialize_field(a.field(), &v)?;
        }
        st.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub id: String,
    pub student_no: String,
    pub full_name: String,
    pub gender: Gender,
    pub class_name: String,
    pub scores: Scores,
    /// Always recomputed from `scores` when the record is materialised.
    pub average: f64,
}

impl StudentRecord {
    pub fn from_parts(id: String, draft: StudentDraft) -> Self {
        let average = calc::student_average(&draft.scores);
        Self {
            id,
            student_no: draft.student_no,
            full_name: draft.full_name,
            gender: draft.gender,
            class_name: draft.class_name,
            scores: draft.scores,
            average,
        }
    }
}

impl Serialize for StudentRecord {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut st = s.serialize_struct("StudentRecord", 9)?;
        st.serialize_field("id", &self.id)?;
        st.serialize_field("studentNo", &self.student_no)?;
        st.serialize_field("fullName", &self.full_name)?;
        st.serialize_field("gender", &self.gender)?;
        st.serialize_field("className", &self.class_name)?;
        for (a, v) in self.scores.iter() {
            st.serialize_field(a.field(), &v)?;
        }
        st.serialize_field("average", &self.average)?;
        st.end()
    }
}

/// Ordered by ascending `student_no` as delivered by the store.
pub type Roster = Vec<StudentRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClassFilter {
    #[default]
    All,
    Class(String),
}

impl ClassFilter {
    pub const ALL_SENTINEL: &'static str = "all";

    /// `None` and the `"all"` sentinel both select every class.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            None => ClassFilter::All,
            Some(v) if v == Self::ALL_SENTINEL => ClassFilter::All,
            Some(v) => ClassFilter::Class(v.to_string()),
        }
    }

    pub fn matches(&self, rec: &StudentRecord) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Class(name) => rec.class_name == *name,
        }
    }
}

impl Serialize for ClassFilter {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            ClassFilter::All => s.serialize_str(Self::ALL_SENTINEL),
            ClassFilter::Class(name) => s.serialize_str(name),
        }
    }
}

/// Colour band the list view uses for a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreBand {
    High,
    Pass,
    Low,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 85.0 {
            ScoreBand::High
        } else if score >= 50.0 {
            ScoreBand::Pass
        } else {
            ScoreBand::Low
        }
    }
}
