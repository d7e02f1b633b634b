use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::{
    errors::{Error, Result},
    geometry::Point,
};

/// Reads instances of the form `N x_0 y_0 x_1 y_1 ... x_{N-1} y_{N-1}` where tokens are separated
/// by arbitrary whitespace (line breaks included). Point `i` gets id `i`.
pub trait PointReader: Sized {
    fn try_read_points<R: Read>(reader: R) -> Result<Self>;
    fn try_read_points_file<P: AsRef<Path>>(path: P) -> Result<Self>;
}

macro_rules! raise_error_unless {
    ($cond : expr, $info : expr) => {
        if !($cond) {
            return Err(Error::InvalidInput($info.into()));
        }
    };
}

macro_rules! parse_next_value {
    ($iterator : expr, $ty : ty, $name : expr) => {{
        let Some(token) = $iterator.next() else {
            return Err(Error::InvalidInput(format!(
                "Premature end of input when parsing {}.",
                $name
            )));
        };

        match token.parse::<$ty>() {
            Ok(value) => value,
            Err(_) => {
                return Err(Error::InvalidInput(format!(
                    "Invalid value '{}' found. Cannot parse {}.",
                    token, $name
                )));
            }
        }
    }};
}

impl PointReader for Vec<Point> {
    fn try_read_points<R: Read>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        parse_points(&content)
    }

    fn try_read_points_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Self::try_read_points(reader)
    }
}

fn parse_points(content: &str) -> Result<Vec<Point>> {
    let mut tokens = content.split_whitespace();

    let n = parse_next_value!(tokens, usize, "number of points");
    // every point takes at least four bytes of input
    let mut points = Vec::with_capacity(n.min(content.len() / 4));

    for id in 0..n {
        let x = parse_next_value!(tokens, f64, format!("x coordinate of point {id}"));
        let y = parse_next_value!(tokens, f64, format!("y coordinate of point {id}"));

        raise_error_unless!(
            x.is_finite() && y.is_finite(),
            format!("Coordinates of point {id} are not finite")
        );

        points.push(Point::new(x, y, id));
    }

    raise_error_unless!(
        tokens.next().is_none(),
        format!("Expected exactly {n} points; found trailing data")
    );

    Ok(points)
}
