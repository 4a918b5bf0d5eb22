//! Address registry
//!
//! A write-once map from question id to the logical places the layout put
//! that question: its data region, its label/score lookup columns and its
//! answer slot. The registry never computes positions itself and never
//! formats references on its own; callers hand it a [`RefFormatter`].

use std::collections::BTreeMap;

use crate::address::{CellRef, RangeRef, RefFormatter};
use crate::error::{AddressKind, Error, Result};

/// The label column and score column a lookup reads from
///
/// In the workbook layout the two columns sit side by side and form one
/// two-column table; in the response-table layout they are separate runs
/// of the same reference column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredRegion {
    /// One cell per option label, in option order
    pub labels: RangeRef,
    /// One cell per option score, parallel to `labels`
    pub scores: RangeRef,
}

impl ScoredRegion {
    pub fn new(labels: RangeRef, scores: RangeRef) -> Self {
        Self { labels, scores }
    }

    /// The combined label+score block, when the score column directly
    /// follows the label column on the same rows
    pub fn as_pair_table(&self) -> Option<RangeRef> {
        let adjacent = self.labels.table == self.scores.table
            && self.labels.cols == 1
            && self.scores.cols == 1
            && self.labels.row == self.scores.row
            && self.labels.rows == self.scores.rows
            && self.scores.col == self.labels.col + 1;
        adjacent.then(|| {
            RangeRef::new(
                self.labels.table.clone(),
                self.labels.row,
                self.labels.col,
                self.labels.rows,
                2,
            )
        })
    }
}

/// Everything recorded for one question
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionAddress {
    pub data_region: Option<RangeRef>,
    pub scored_region: Option<ScoredRegion>,
    pub answer_slot: Option<CellRef>,
}

#[derive(Debug, Default)]
pub struct AddressRegistry {
    entries: BTreeMap<String, QuestionAddress>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the data region of a question
    ///
    /// Fails if the question already has one, or if the region intersects
    /// any region already recorded in the same table.
    pub fn record_data_region(&mut self, question: &str, region: RangeRef) -> Result<()> {
        if let Some(other) = self.find_overlap(question, |entry| {
            entry
                .data_region
                .as_ref()
                .is_some_and(|existing| existing.overlaps(&region))
        }) {
            return Err(Error::OverlappingRegion {
                question: question.to_string(),
                other,
                table: region.table.clone(),
                kind: AddressKind::DataRegion,
            });
        }

        let entry = self.entries.entry(question.to_string()).or_default();
        if entry.data_region.is_some() {
            return Err(Error::DuplicateAddress {
                question: question.to_string(),
                kind: AddressKind::DataRegion,
            });
        }
        entry.data_region = Some(region);
        Ok(())
    }

    /// Record the lookup columns of a question
    pub fn record_scored_region(&mut self, question: &str, scored: ScoredRegion) -> Result<()> {
        let entry = self.entries.entry(question.to_string()).or_default();
        if entry.scored_region.is_some() {
            return Err(Error::DuplicateAddress {
                question: question.to_string(),
                kind: AddressKind::ScoredRegion,
            });
        }
        entry.scored_region = Some(scored);
        Ok(())
    }

    /// Record the answer slot of a question
    ///
    /// Fails if the question already has one or if another question owns
    /// the same cell.
    pub fn record_answer_slot(&mut self, question: &str, cell: CellRef) -> Result<()> {
        if let Some(other) = self.find_overlap(question, |entry| {
            entry.answer_slot.as_ref() == Some(&cell)
        }) {
            return Err(Error::OverlappingRegion {
                question: question.to_string(),
                other,
                table: cell.table.clone(),
                kind: AddressKind::AnswerSlot,
            });
        }

        let entry = self.entries.entry(question.to_string()).or_default();
        if entry.answer_slot.is_some() {
            return Err(Error::DuplicateAddress {
                question: question.to_string(),
                kind: AddressKind::AnswerSlot,
            });
        }
        entry.answer_slot = Some(cell);
        Ok(())
    }

    pub fn data_region_of(&self, question: &str) -> Result<&RangeRef> {
        self.lookup(question, AddressKind::DataRegion, |e| e.data_region.as_ref())
    }

    pub fn scored_region_of(&self, question: &str) -> Result<&ScoredRegion> {
        self.lookup(question, AddressKind::ScoredRegion, |e| {
            e.scored_region.as_ref()
        })
    }

    pub fn answer_slot_of(&self, question: &str) -> Result<&CellRef> {
        self.lookup(question, AddressKind::AnswerSlot, |e| e.answer_slot.as_ref())
    }

    /// Formatted reference to the data region
    pub fn data_region_ref(&self, question: &str, fmt: &dyn RefFormatter) -> Result<String> {
        Ok(fmt.range(self.data_region_of(question)?))
    }

    /// Formatted reference to the option labels (drop-down source)
    pub fn labels_ref(&self, question: &str, fmt: &dyn RefFormatter) -> Result<String> {
        Ok(fmt.range(&self.scored_region_of(question)?.labels))
    }

    /// Formatted reference to the answer slot
    pub fn answer_slot_ref(&self, question: &str, fmt: &dyn RefFormatter) -> Result<String> {
        Ok(fmt.cell(self.answer_slot_of(question)?))
    }

    /// Number of questions with at least one recorded address
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries, ordered by question id
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuestionAddress)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup<'a, T>(
        &'a self,
        question: &str,
        kind: AddressKind,
        pick: impl Fn(&'a QuestionAddress) -> Option<&'a T>,
    ) -> Result<&'a T> {
        self.entries
            .get(question)
            .and_then(pick)
            .ok_or_else(|| Error::MissingAddress {
                question: question.to_string(),
                kind,
            })
    }

    fn find_overlap(
        &self,
        question: &str,
        clashes: impl Fn(&QuestionAddress) -> bool,
    ) -> Option<String> {
        self.entries
            .iter()
            .find(|(id, entry)| id.as_str() != question && clashes(entry))
            .map(|(id, _)| id.clone())
    }
}
