//! # Game Records
//!
//! Reading and writing the archival text format: a single main line of
//! nodes in the common `(;GM[1]FF[4]SZ[19]...;B[pd];W[dp])` shape.
//!
//! The archival format counts rows from the top edge while the engine counts
//! from the bottom, so `archive_row = size - 1 - y` in both directions. An
//! empty move value (or `tt` on boards up to 19x19) is a pass.
//!
//! Only the subset needed for import and export is understood. Variations
//! are ignored after the main line, setup stones are rejected, and unknown
//! properties are skipped.

use crate::error::RecordError;
use crate::game::GameResult;
use crate::types::{Color, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Board size assumed when a record has no `SZ` property.
pub const DEFAULT_RECORD_SIZE: usize = 19;

/// One ply of a game: who moved and where (`None` for a pass).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedMove {
    pub color: Color,
    pub point: Option<Point>,
}

impl RecordedMove {
    pub fn place(color: Color, x: usize, y: usize) -> Self {
        Self {
            color,
            point: Some(Point::new(x, y)),
        }
    }

    pub fn pass(color: Color) -> Self {
        Self { color, point: None }
    }
}

/// Header and main line of a game record.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub size: usize,
    pub komi: Option<f64>,
    pub black: Option<String>,
    pub white: Option<String>,
    pub result: Option<String>,
    pub moves: Vec<RecordedMove>,
}

impl GameRecord {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            komi: None,
            black: None,
            white: None,
            result: None,
            moves: Vec::new(),
        }
    }

    /// Sets the result property from a finished game.
    pub fn with_result(mut self, result: Option<&GameResult>) -> Self {
        self.result = result.map(GameResult::record_code);
        self
    }

    /// Parses record text.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        Parser::new(text).parse()
    }

    fn encode_point(&self, point: Point) -> String {
        let column = char::from(b'a' + point.x as u8);
        let row = char::from(b'a' + (self.size - 1 - point.y) as u8);
        format!("{column}{row}")
    }

    fn decode_point(&self, value: &str) -> Result<Option<Point>, RecordError> {
        let invalid = || RecordError::InvalidValue {
            property: "B/W".to_string(),
            value: value.to_string(),
        };
        if value.is_empty() || (value == "tt" && self.size <= 19) {
            return Ok(None);
        }
        let bytes = value.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_lowercase) {
            return Err(invalid());
        }
        let x = usize::from(bytes[0] - b'a');
        let row = usize::from(bytes[1] - b'a');
        if x >= self.size || row >= self.size {
            return Err(invalid());
        }
        Ok(Some(Point::new(x, self.size - 1 - row)))
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace(']', "\\]")
}

impl fmt::Display for GameRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(;GM[1]FF[4]CA[UTF-8]SZ[{}]", self.size)?;
        if let Some(komi) = self.komi {
            write!(f, "KM[{komi}]")?;
        }
        if let Some(black) = &self.black {
            write!(f, "PB[{}]", escape(black))?;
        }
        if let Some(white) = &self.white {
            write!(f, "PW[{}]", escape(white))?;
        }
        if let Some(result) = &self.result {
            write!(f, "RE[{}]", escape(result))?;
        }
        for mv in &self.moves {
            let coords = mv.point.map(|p| self.encode_point(p)).unwrap_or_default();
            write!(f, ";{}[{}]", mv.color.record_tag(), coords)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.text.len(), |(i, _)| *i)
    }

    fn malformed(&mut self, reason: &str) -> RecordError {
        RecordError::Malformed {
            offset: self.offset(),
            reason: reason.to_string(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn parse(mut self) -> Result<GameRecord, RecordError> {
        self.skip_whitespace();
        if self.chars.next_if(|(_, c)| *c == '(').is_none() {
            return Err(self.malformed("expected '('"));
        }

        let mut record = GameRecord::new(DEFAULT_RECORD_SIZE);
        let mut seen_move = false;
        loop {
            self.skip_whitespace();
            match self.chars.peek().map(|(_, c)| *c) {
                Some(';') => {
                    self.chars.next();
                }
                Some(')') | Some('(') => break,
                Some(c) if c.is_ascii_uppercase() => {
                    let (name, values) = self.property()?;
                    self.apply(&mut record, &name, &values, &mut seen_move)?;
                }
                Some(_) => return Err(self.malformed("unexpected character")),
                None => return Err(self.malformed("unterminated record")),
            }
        }
        Ok(record)
    }

    fn property(&mut self) -> Result<(String, Vec<String>), RecordError> {
        let mut name = String::new();
        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_uppercase()) {
            name.push(c);
        }
        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            if self.chars.next_if(|(_, c)| *c == '[').is_none() {
                break;
            }
            let mut value = String::new();
            loop {
                match self.chars.next() {
                    Some((_, '\\')) => match self.chars.next() {
                        Some((_, escaped)) => value.push(escaped),
                        None => return Err(self.malformed("dangling escape")),
                    },
                    Some((_, ']')) => break,
                    Some((_, c)) => value.push(c),
                    None => return Err(self.malformed("unterminated property value")),
                }
            }
            values.push(value);
        }
        if values.is_empty() {
            return Err(self.malformed("property without value"));
        }
        Ok((name, values))
    }

    fn apply(
        &mut self,
        record: &mut GameRecord,
        name: &str,
        values: &[String],
        seen_move: &mut bool,
    ) -> Result<(), RecordError> {
        let value = values[0].trim();
        let invalid = || RecordError::InvalidValue {
            property: name.to_string(),
            value: value.to_string(),
        };
        match name {
            "SZ" => {
                if *seen_move {
                    return Err(self.malformed("board size after first move"));
                }
                record.size = value.parse().map_err(|_| invalid())?;
                if !(1..=26).contains(&record.size) {
                    return Err(invalid());
                }
            }
            "KM" => record.komi = Some(value.parse().map_err(|_| invalid())?),
            "PB" => record.black = Some(values[0].clone()),
            "PW" => record.white = Some(values[0].clone()),
            "RE" => record.result = Some(values[0].clone()),
            "B" | "W" => {
                let color = if name == "B" { Color::Black } else { Color::White };
                let point = record.decode_point(value)?;
                record.moves.push(RecordedMove { color, point });
                *seen_move = true;
            }
            "AB" | "AW" | "AE" => return Err(RecordError::Unsupported(name.to_string())),
            _ => {}
        }
        Ok(())
    }
}
