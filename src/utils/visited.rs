use crate::geometry::Node;

/// Set of nodes already placed on the partial tour of a search branch.
#[derive(Clone, Debug)]
pub struct VisitedSet {
    data: Vec<bool>,
}

impl VisitedSet {
    #[inline(always)]
    pub fn new(n: usize) -> Self {
        Self {
            data: vec![false; n],
        }
    }

    #[inline(always)]
    pub fn is_visited(&self, u: Node) -> bool {
        self.data[u]
    }

    #[inline(always)]
    pub fn visit(&mut self, u: Node) {
        debug_assert!(!self.data[u]);
        self.data[u] = true;
    }

    #[inline(always)]
    pub fn unvisit(&mut self, u: Node) {
        debug_assert!(self.data[u]);
        self.data[u] = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn visit_and_unvisit() {
        let mut set = VisitedSet::new(5);
        assert!((0..5).all(|u| !set.is_visited(u)));

        set.visit(0);
        set.visit(3);
        assert!(set.is_visited(3));
        assert!(!set.is_visited(2));

        set.unvisit(3);
        assert!(!set.is_visited(3));
        assert!(set.is_visited(0));
    }
}
