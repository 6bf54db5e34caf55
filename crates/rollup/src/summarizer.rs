// Copyright (C) 2026-present The NetGauze Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reduction of child bucket values into a single parent value.
//!
//! The output of a summarizer is fed back into it one level up (minutes are
//! summarized into hours, hours into days, ...), so a summarizer must be
//! closed over `T`. The engine only ever calls it with a non-empty list,
//! ordered by ascending bucket start.

use std::{cmp::Ordering, convert::Infallible};

/// Reduces a non-empty ordered list of values into one value.
///
/// Any `Fn(Vec<T>) -> T` is an infallible summarizer.
pub trait Summarizer<T> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn summarize(&self, values: Vec<T>) -> Result<T, Self::Error>;
}

impl<T, F> Summarizer<T> for F
where
    F: Fn(Vec<T>) -> T,
{
    type Error = Infallible;

    fn summarize(&self, values: Vec<T>) -> Result<T, Self::Error> {
        Ok(self(values))
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum SummarizeError {
    #[error("no values to summarize")]
    EmptyInput,

    #[error("values cannot be ordered")]
    Incomparable,
}

/// Adds all values
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl<T: std::iter::Sum<T>> Summarizer<T> for Sum {
    type Error = SummarizeError;

    fn summarize(&self, values: Vec<T>) -> Result<T, Self::Error> {
        if values.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        Ok(values.into_iter().sum())
    }
}

/// Arithmetic mean. Note that the mean of means is only the overall mean
/// when every child bucket carries the same weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Summarizer<f64> for Mean {
    type Error = SummarizeError;

    fn summarize(&self, values: Vec<f64>) -> Result<f64, Self::Error> {
        if values.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        let count = values.len() as f64;
        Ok(values.into_iter().sum::<f64>() / count)
    }
}

#[inline]
fn select_by<T: PartialOrd>(values: Vec<T>, keep: Ordering) -> Result<T, SummarizeError> {
    let mut iter = values.into_iter();
    let mut selected = iter.next().ok_or(SummarizeError::EmptyInput)?;
    for value in iter {
        match value.partial_cmp(&selected) {
            Some(ordering) if ordering == keep => selected = value,
            Some(_) => {}
            None => return Err(SummarizeError::Incomparable),
        }
    }
    // a lone NaN is never compared against anything in the loop
    if selected.partial_cmp(&selected).is_none() {
        return Err(SummarizeError::Incomparable);
    }
    Ok(selected)
}

/// Smallest value, fails on values without a total order (e.g. NaN)
#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

impl<T: PartialOrd> Summarizer<T> for Min {
    type Error = SummarizeError;

    fn summarize(&self, values: Vec<T>) -> Result<T, Self::Error> {
        select_by(values, Ordering::Less)
    }
}

/// Largest value, fails on values without a total order (e.g. NaN)
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl<T: PartialOrd> Summarizer<T> for Max {
    type Error = SummarizeError;

    fn summarize(&self, values: Vec<T>) -> Result<T, Self::Error> {
        select_by(values, Ordering::Greater)
    }
}

/// Concatenates string values with a separator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    separator: String,
}

impl Join {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for Join {
    fn default() -> Self {
        Self::new(",")
    }
}

impl Summarizer<String> for Join {
    type Error = SummarizeError;

    fn summarize(&self, values: Vec<String>) -> Result<String, Self::Error> {
        if values.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        Ok(values.join(&self.separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_summarizer() {
        let product = |values: Vec<u64>| values.into_iter().product::<u64>();
        assert_eq!(product.summarize(vec![2, 3, 4]), Ok(24));
        assert_eq!(product.summarize(vec![7]), Ok(7));
    }

    #[test]
    fn test_sum() {
        assert_eq!(Sum.summarize(vec![1i64, 2, 3]), Ok(6));
        assert_eq!(
            Summarizer::<i64>::summarize(&Sum, vec![]),
            Err(SummarizeError::EmptyInput)
        );
    }

    #[test]
    fn test_mean() {
        assert_eq!(Mean.summarize(vec![1.0, 2.0, 6.0]), Ok(3.0));
        assert_eq!(Mean.summarize(vec![2333.0]), Ok(2333.0));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(Min.summarize(vec![5, 3, 9]), Ok(3));
        assert_eq!(Max.summarize(vec![5, 3, 9]), Ok(9));
        assert_eq!(Max.summarize(vec![1.5, -2.0]), Ok(1.5));
        assert_eq!(
            Min.summarize(vec![1.0, f64::NAN, 0.5]),
            Err(SummarizeError::Incomparable)
        );
        assert_eq!(
            Max.summarize(vec![f64::NAN]),
            Err(SummarizeError::Incomparable)
        );
        assert_eq!(
            Summarizer::<u8>::summarize(&Min, vec![]),
            Err(SummarizeError::EmptyInput)
        );
    }

    #[test]
    fn test_join() {
        let values = vec!["2".to_string(), "3".to_string(), "4".to_string()];
        assert_eq!(
            Join::default().summarize(values.clone()),
            Ok("2,3,4".into())
        );
        assert_eq!(Join::new(" | ").summarize(values), Ok("2 | 3 | 4".into()));
    }
}
