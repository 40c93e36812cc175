//! Aggregates over a result collection.

use vista_core::schema::Column;
use vista_core::{DataType, Error, Result, Value};

/// Aggregate function applied to one column of a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Min,
    Max,
    Sum,
    Average,
}

impl AggregateFunction {
    fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Average => "average",
        }
    }

    /// Returns true if the function can be applied to columns of `data_type`.
    pub fn supports(&self, data_type: DataType) -> bool {
        match self {
            AggregateFunction::Min | AggregateFunction::Max => data_type.is_ordered(),
            AggregateFunction::Sum | AggregateFunction::Average => data_type.is_numeric(),
        }
    }
}

/// Computes `function` over the values of `column`.
///
/// Null values are skipped. `Average` of nothing is `0.0`; the other
/// functions return `None` when there is nothing to aggregate.
pub fn compute<'a>(
    function: AggregateFunction,
    column: &Column,
    values: impl Iterator<Item = &'a Value>,
) -> Result<Option<Value>> {
    if !function.supports(column.data_type()) {
        return Err(Error::invalid_argument(format!(
            "Cannot compute {} of column {} of type {:?}",
            function.name(),
            column.name(),
            column.data_type()
        )));
    }

    let values = values.filter(|v| !v.is_null());
    let result = match function {
        AggregateFunction::Min => values.min().cloned(),
        AggregateFunction::Max => values.max().cloned(),
        AggregateFunction::Sum => sum(column, values)?,
        AggregateFunction::Average => {
            let (total, count) = values
                .filter_map(Value::as_number)
                .fold((0.0f64, 0usize), |(total, count), v| (total + v, count + 1));
            if count == 0 {
                Some(Value::Float64(0.0))
            } else {
                Some(Value::Float64(total / count as f64))
            }
        }
    };
    Ok(result)
}

fn sum<'a>(column: &Column, values: impl Iterator<Item = &'a Value>) -> Result<Option<Value>> {
    let mut values = values.peekable();
    if values.peek().is_none() {
        return Ok(None);
    }
    if column.data_type() == DataType::Float64 {
        return Ok(Some(Value::Float64(values.filter_map(Value::as_number).sum())));
    }

    let mut total = 0i64;
    for value in values {
        let v = match value {
            Value::Int32(i) => i64::from(*i),
            Value::Int64(i) => *i,
            _ => continue,
        };
        total = total.checked_add(v).ok_or_else(|| {
            Error::invalid_argument(format!("Sum of column {} overflows Int64", column.name()))
        })?;
    }
    Ok(Some(Value::Int64(total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(data_type: DataType) -> Column {
        Column::new("c", data_type).nullable(true)
    }

    #[test]
    fn test_min_max_sum_average() {
        let values = [Value::Int64(4), Value::Null, Value::Int64(1), Value::Int64(7)];
        let col = column(DataType::Int64);
        let run = |f| compute(f, &col, values.iter()).unwrap();

        assert_eq!(run(AggregateFunction::Min), Some(Value::Int64(1)));
        assert_eq!(run(AggregateFunction::Max), Some(Value::Int64(7)));
        assert_eq!(run(AggregateFunction::Sum), Some(Value::Int64(12)));
        assert_eq!(run(AggregateFunction::Average), Some(Value::Float64(4.0)));
    }

    #[test]
    fn test_int32_sum_widens() {
        let values = [Value::Int32(i32::MAX), Value::Int32(1)];
        let sum = compute(AggregateFunction::Sum, &column(DataType::Int32), values.iter()).unwrap();
        assert_eq!(sum, Some(Value::Int64(i32::MAX as i64 + 1)));
    }

    #[test]
    fn test_int64_sum_overflow_is_an_error() {
        let values = [Value::Int64(i64::MAX), Value::Int64(1)];
        let err = compute(AggregateFunction::Sum, &column(DataType::Int64), values.iter()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let values = [Value::Int64(i64::MAX), Value::Int64(-1), Value::Int64(1)];
        let sum = compute(AggregateFunction::Sum, &column(DataType::Int64), values.iter()).unwrap();
        assert_eq!(sum, Some(Value::Int64(i64::MAX)));
    }

    #[test]
    fn test_float_sum() {
        let values = [Value::Float64(1.5), Value::Float64(2.0)];
        let sum = compute(AggregateFunction::Sum, &column(DataType::Float64), values.iter()).unwrap();
        assert_eq!(sum, Some(Value::Float64(3.5)));
    }

    #[test]
    fn test_empty_average_is_zero() {
        let col = column(DataType::Float64);
        let empty: [Value; 0] = [];
        assert_eq!(
            compute(AggregateFunction::Average, &col, empty.iter()).unwrap(),
            Some(Value::Float64(0.0))
        );
        assert_eq!(compute(AggregateFunction::Min, &col, empty.iter()).unwrap(), None);
        assert_eq!(compute(AggregateFunction::Max, &col, empty.iter()).unwrap(), None);
        assert_eq!(compute(AggregateFunction::Sum, &col, empty.iter()).unwrap(), None);

        let nulls = [Value::Null, Value::Null];
        assert_eq!(
            compute(AggregateFunction::Average, &col, nulls.iter()).unwrap(),
            Some(Value::Float64(0.0))
        );
        assert_eq!(compute(AggregateFunction::Sum, &col, nulls.iter()).unwrap(), None);
    }

    #[test]
    fn test_datetime_min_only() {
        let col = column(DataType::DateTime);
        let values = [Value::DateTime(20), Value::DateTime(10)];
        assert_eq!(
            compute(AggregateFunction::Min, &col, values.iter()).unwrap(),
            Some(Value::DateTime(10))
        );
        let err = compute(AggregateFunction::Sum, &col, values.iter()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_non_numeric_rejected() {
        for data_type in [DataType::Boolean, DataType::String, DataType::Bytes] {
            for function in [
                AggregateFunction::Min,
                AggregateFunction::Max,
                AggregateFunction::Sum,
                AggregateFunction::Average,
            ] {
                let empty: [Value; 0] = [];
                let result = compute(function, &column(data_type), empty.iter());
                assert!(matches!(result, Err(Error::InvalidArgument { .. })));
            }
        }
    }
}
