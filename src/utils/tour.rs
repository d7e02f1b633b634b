use crate::{
    errors::{Error, InvariantCheck},
    geometry::{Node, Point, PointId},
};

/// A closed tour, stored as the ids of the visited points in visiting order. The edge from the
/// last back to the first point is implicit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tour {
    number_of_points: usize,
    ids: Vec<PointId>,
}

impl Tour {
    /// Creates an empty tour over a point set of size `number_of_points`.
    pub fn new(number_of_points: usize) -> Self {
        Self {
            number_of_points,
            ids: Vec::with_capacity(number_of_points),
        }
    }

    /// Translates a tour given as indices into `points` into original point ids.
    ///
    /// # Example
    /// ```
    /// use etsp::{geometry::Point, utils::Tour};
    /// let points = [Point::new(0.0, 0.0, 7), Point::new(1.0, 0.0, 3)];
    /// let tour = Tour::from_nodes(&[1, 0], &points);
    /// assert_eq!(tour.ids(), &[3, 7]);
    /// ```
    pub fn from_nodes(nodes: &[Node], points: &[Point]) -> Self {
        Self {
            number_of_points: points.len(),
            ids: nodes.iter().map(|&u| points[u].id).collect(),
        }
    }

    /// Builds a tour from ids directly; nothing is validated here, see [`InvariantCheck`].
    pub fn from_ids(number_of_points: usize, ids: Vec<PointId>) -> Self {
        Self {
            number_of_points,
            ids,
        }
    }

    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl InvariantCheck<Error> for Tour {
    /// A tour is correct iff it visits every point id `0..number_of_points` exactly once.
    fn is_correct(&self) -> Result<(), Error> {
        if self.ids.len() != self.number_of_points {
            return Err(Error::InvalidTour(format!(
                "tour has {} entries, expected {}",
                self.ids.len(),
                self.number_of_points
            )));
        }

        let mut seen = vec![false; self.number_of_points];
        for &id in &self.ids {
            match seen.get_mut(id) {
                None => {
                    return Err(Error::InvalidTour(format!("point id {id} out of range")));
                }
                Some(true) => {
                    return Err(Error::InvalidTour(format!("point id {id} visited twice")));
                }
                Some(flag) => *flag = true,
            }
        }

        Ok(())
    }
}

/// Result of a solver run: the tour, its cost and whether it is provably optimal.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub tour: Tour,
    pub cost: f64,
    pub exact: bool,
}

impl Solution {
    pub fn new(tour: Tour, cost: f64, exact: bool) -> Self {
        Self { tour, cost, exact }
    }

    /// The solution of an instance without points.
    pub fn empty(exact: bool) -> Self {
        Self::new(Tour::new(0), 0.0, exact)
    }
}
