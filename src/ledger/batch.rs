//! Batch construction for transaction entry and matching

use bigdecimal::BigDecimal;

use crate::types::{LineInput, TransactionHeader};

/// One proposed allocation between the batch's subject and a counterpart
///
/// The value is expressed in the counterpart's stored sign. A `match_id`
/// references an existing record to edit; leaving it out proposes a new one.
/// Submitting a zero value against an existing record deletes it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchInstruction {
    pub counterpart_id: String,
    pub match_id: Option<String>,
    pub value: BigDecimal,
}

impl MatchInstruction {
    /// Propose a new match against a counterpart
    pub fn new(counterpart_id: impl Into<String>, value: BigDecimal) -> Self {
        Self {
            counterpart_id: counterpart_id.into(),
            match_id: None,
            value,
        }
    }

    /// Edit an existing match record's value
    pub fn edit(
        match_id: impl Into<String>,
        counterpart_id: impl Into<String>,
        value: BigDecimal,
    ) -> Self {
        Self {
            counterpart_id: counterpart_id.into(),
            match_id: Some(match_id.into()),
            value,
        }
    }
}

/// A unit of submitted work: one subject header with its lines and matches
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub header: TransactionHeader,
    pub lines: Vec<LineInput>,
    pub matches: Vec<MatchInstruction>,
}

impl Batch {
    pub fn new(header: TransactionHeader) -> Self {
        Self {
            header,
            lines: Vec::new(),
            matches: Vec::new(),
        }
    }
}

/// Fluent builder for assembling a [`Batch`]
pub struct BatchBuilder {
    batch: Batch,
}

impl BatchBuilder {
    pub fn from_header(header: TransactionHeader) -> Self {
        Self {
            batch: Batch::new(header),
        }
    }

    /// Add a line with goods and vat amounts
    pub fn line(mut self, description: impl Into<String>, goods: BigDecimal, vat: BigDecimal) -> Self {
        self.batch.lines.push(LineInput {
            description: description.into(),
            goods: Some(goods),
            vat: Some(vat),
            nominal_ref: None,
            vat_code_ref: None,
        });
        self
    }

    /// Add a raw line input, blanks and all
    pub fn line_input(mut self, line: LineInput) -> Self {
        self.batch.lines.push(line);
        self
    }

    /// Propose a new match against a counterpart
    pub fn match_value(mut self, counterpart_id: impl Into<String>, value: BigDecimal) -> Self {
        self.batch.matches.push(MatchInstruction::new(counterpart_id, value));
        self
    }

    /// Edit an existing match record
    pub fn edit_match(
        mut self,
        match_id: impl Into<String>,
        counterpart_id: impl Into<String>,
        value: BigDecimal,
    ) -> Self {
        self.batch
            .matches
            .push(MatchInstruction::edit(match_id, counterpart_id, value));
        self
    }

    pub fn build(self) -> Batch {
        self.batch
    }
}
