// ********* Input data structures ***********

use std::fmt::Display;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use snafu::prelude::*;

/// The three candidate categories, declared in priority order.
///
/// The derived ordering is the redistribution precedence: `Aluno` is served
/// first, `ComunidadeExterna` last.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Category {
    Aluno,
    Servidor,
    ComunidadeExterna,
}

impl Category {
    /// All the categories, highest priority first.
    pub const ALL: [Category; 3] = [
        Category::Aluno,
        Category::Servidor,
        Category::ComunidadeExterna,
    ];

    /// 1 for the highest priority.
    pub fn rank(self) -> u8 {
        self.index() as u8 + 1
    }

    /// The label used in input files and reports.
    pub fn label(self) -> &'static str {
        match self {
            Category::Aluno => "Aluno",
            Category::Servidor => "Servidor",
            Category::ComunidadeExterna => "Comunidade Externa",
        }
    }

    fn index(self) -> usize {
        match self {
            Category::Aluno => 0,
            Category::Servidor => 1,
            Category::ComunidadeExterna => 2,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Category::ALL
            .iter()
            .find(|c| c.label() == label)
            .copied()
            .context(UnresolvedCategorySnafu {
                id: "",
                label: label.to_string(),
            })
    }
}

/// One value per category, stored in priority order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct PerCategory<T>(pub [T; 3]);

impl<T> PerCategory<T> {
    pub fn new(aluno: T, servidor: T, comunidade_externa: T) -> PerCategory<T> {
        PerCategory([aluno, servidor, comunidade_externa])
    }

    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> PerCategory<T> {
        PerCategory([
            f(Category::Aluno),
            f(Category::Servidor),
            f(Category::ComunidadeExterna),
        ])
    }

    /// Pairs of (category, value), highest priority first.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PerCategory<U> {
        PerCategory(self.0.map(f))
    }
}

impl<T> Index<Category> for PerCategory<T> {
    type Output = T;
    fn index(&self, c: Category) -> &T {
        &self.0[c.index()]
    }
}

impl<T> IndexMut<Category> for PerCategory<T> {
    fn index_mut(&mut self, c: Category) -> &mut T {
        &mut self.0[c.index()]
    }
}

/// A candidate, with a category already resolved.
///
/// The attributes are the columns of the input, in input order. The engine
/// never looks at them; they are only carried to the output.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub attributes: Vec<(String, String)>,
    pub category: Category,
}

impl Candidate {
    pub fn new(id: &str, category: Category) -> Candidate {
        Candidate {
            id: id.to_string(),
            attributes: Vec::new(),
            category,
        }
    }

    pub fn with_attributes(
        id: &str,
        category: Category,
        attributes: Vec<(String, String)>,
    ) -> Candidate {
        Candidate {
            id: id.to_string(),
            attributes,
            category,
        }
    }

    /// The first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An independent allocation unit (a class, or "turma").
#[derive(PartialEq, Debug, Clone)]
pub struct Group {
    pub id: String,
    pub candidates: Vec<Candidate>,
    /// The seat count declared with the group, if any.
    pub seats: Option<u32>,
    /// Percentages for this group only, in place of the ones of the run.
    /// A class closed to a category gets a zero percentage for it.
    pub percentages: Option<PerCategory<f64>>,
}

impl Group {
    pub fn new(id: &str, candidates: Vec<Candidate>, seats: Option<u32>) -> Group {
        Group {
            id: id.to_string(),
            candidates,
            seats,
            percentages: None,
        }
    }
}

// ********* Configuration **********

// Sums are compared with this tolerance, and products get it added before
// flooring: 0.29 * 100.0 is 28.999999999999996 in binary.
pub(crate) const PCT_EPSILON: f64 = 1e-9;

/// Number of seats and share of the seats reserved for each category.
///
/// The percentages do not need to sum to 1. Whatever is left after rounding
/// down is handed out as leftover, in priority order.
#[derive(PartialEq, Debug, Clone)]
pub struct QuotaConfig {
    pub total_seats: u32,
    pub percentages: PerCategory<f64>,
}

impl QuotaConfig {
    pub fn new(total_seats: u32, percentages: PerCategory<f64>) -> LotteryResult<QuotaConfig> {
        validate_percentages(&percentages)?;
        Ok(QuotaConfig {
            total_seats,
            percentages,
        })
    }
}

/// Checks that every percentage is within [0, 1] and that they sum to at most 1.
pub fn validate_percentages(percentages: &PerCategory<f64>) -> LotteryResult<()> {
    for (category, value) in percentages.iter() {
        ensure!(
            value.is_finite() && (0.0..=1.0).contains(value),
            InvalidPercentageSnafu {
                category,
                value: *value
            }
        );
    }
    let total: f64 = percentages.0.iter().sum();
    ensure!(
        total <= 1.0 + PCT_EPSILON,
        PercentagesExceedOneSnafu { total }
    );
    Ok(())
}

// ******** Output data structures *********

/// What happened to one category during a draw.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct CategoryStats {
    /// floor(seats * percentage)
    pub base_quota: u32,
    /// Seats received from the rounding leftover.
    pub rounding_bonus: u32,
    /// Seats passed down by higher-priority categories that lacked candidates.
    pub carried_in: u32,
    /// base_quota + rounding_bonus + carried_in
    pub quota: u32,
    /// Number of candidates in the category.
    pub available: u32,
    /// Candidates approved against the quota.
    pub approved: u32,
    /// Candidates approved in the final sweep, on seats nobody else could take.
    pub swept_in: u32,
    /// Seats this category could not fill and passed on.
    pub shortfall: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Allocation {
    /// Approved candidates, category by category in priority order.
    pub approved: Vec<Candidate>,
    /// Everyone else, category by category in priority order, in draw order.
    pub waitlist: Vec<Candidate>,
    pub stats: PerCategory<CategoryStats>,
    /// Seats left empty because there were not enough candidates.
    pub unfilled: u32,
}

impl Allocation {
    pub fn total_seats(&self) -> u32 {
        self.approved.len() as u32 + self.unfilled
    }
}

/// Errors that prevent a draw from taking place.
///
/// All of them are detected before any candidate is drawn.
#[derive(PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LotteryError {
    #[snafu(display("percentage for {category} must be within [0, 1], got {value}"))]
    InvalidPercentage { category: Category, value: f64 },

    #[snafu(display("percentages sum to {total}, which is more than 1"))]
    PercentagesExceedOne { total: f64 },

    #[snafu(display(
        "group {group_id:?} has no seat count: declare one with the group or provide an override"
    ))]
    MissingGroupSeats { group_id: String },

    #[snafu(display("group {group_id:?} appears more than once"))]
    DuplicateGroup { group_id: String },

    #[snafu(display("candidate {id:?} appears more than once"))]
    DuplicateCandidate { id: String },

    #[snafu(display(
        "cannot resolve category {label:?} for candidate {id:?}: expected one of Aluno, Servidor, Comunidade Externa"
    ))]
    UnresolvedCategory { id: String, label: String },

    #[snafu(display("cannot derive the random stream for {salt:?}"))]
    SeedDerivation {
        source: hex::FromHexError,
        salt: String,
    },
}

pub type LotteryResult<T> = Result<T, LotteryError>;
