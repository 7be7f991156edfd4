use ark_ff::PrimeField;

/// What a variable resolves to once its equivalence class is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Root<F> {
    /// `value = coeff * var + offset`, where `var` is the representative of
    /// the class.
    Var { var: usize, coeff: F, offset: F },
    /// The whole class is pinned to a constant.
    Constant(F),
}

impl<F: PrimeField> Root<F> {
    fn identity(var: usize) -> Self {
        Root::Var {
            var,
            coeff: F::one(),
            offset: F::zero(),
        }
    }

    /// Given `x = coeff * self + offset`, returns what `x` resolves to.
    fn compose(self, coeff: F, offset: F) -> Self {
        match self {
            Root::Var {
                var,
                coeff: c,
                offset: o,
            } => Root::Var {
                var,
                coeff: coeff * c,
                offset: coeff * o + offset,
            },
            Root::Constant(k) => Root::Constant(coeff * k + offset),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Parent<F> {
    Root,
    Var { parent: usize, coeff: F, offset: F },
    Constant(F),
}

#[derive(Debug, Clone, Default)]
/// Tarjan's Union-Find over variable indices, where every link carries an
/// affine relation `child = coeff * parent + offset`.
///
/// Nodes live in an arena indexed by allocation order. Classes are merged by
/// linking a representative under another one, and a representative can be
/// pinned to a constant, which pins its whole class.
pub struct DisjointSet<F> {
    parent: Vec<Parent<F>>,
}

impl<F> DisjointSet<F>
where
    F: PrimeField,
{
    pub fn new() -> Self {
        DisjointSet { parent: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DisjointSet {
            parent: Vec::with_capacity(capacity),
        }
    }

    /// Adds a singleton class and returns its index.
    pub fn make_set(&mut self) -> usize {
        self.parent.push(Parent::Root);
        self.parent.len() - 1
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Returns `Some(root)` describing `x` in terms of its representative,
    /// compressing the path on the way. If `x` is not in the data structure,
    /// it returns `None`.
    pub fn find(&mut self, x: usize) -> Option<Root<F>> {
        if x >= self.parent.len() {
            return None;
        }

        let mut path = vec![];
        let mut current = x;
        let root = loop {
            match self.parent[current] {
                Parent::Root => break Root::identity(current),
                Parent::Constant(k) => break Root::Constant(k),
                Parent::Var { parent, .. } => {
                    path.push(current);
                    current = parent;
                }
            }
        };

        // walk back down, pointing every node straight at the representative
        let mut resolved = root;
        for node in path.into_iter().rev() {
            let Parent::Var { coeff, offset, .. } = self.parent[node] else {
                unreachable!("only linked nodes are on the path")
            };
            resolved = resolved.compose(coeff, offset);
            self.parent[node] = match resolved {
                Root::Var { var, coeff, offset } => Parent::Var {
                    parent: var,
                    coeff,
                    offset,
                },
                Root::Constant(k) => Parent::Constant(k),
            };
        }
        Some(resolved)
    }

    /// Whether `x` is the representative of a class that is not pinned to a
    /// constant.
    pub fn is_root(&self, x: usize) -> bool {
        matches!(self.parent.get(x), Some(Parent::Root))
    }

    /// Records `child = coeff * parent + offset`. Both must be free
    /// representatives and `parent` must be the older of the two, so that the
    /// representative of a class is always its first allocated variable.
    pub fn link(&mut self, child: usize, parent: usize, coeff: F, offset: F) {
        assert!(parent < child, "the older variable must stay representative");
        assert!(self.is_root(child) && self.is_root(parent));
        assert!(!coeff.is_zero(), "a link must be invertible");
        self.parent[child] = Parent::Var {
            parent,
            coeff,
            offset,
        };
    }

    /// Pins the class of the free representative `root` to `value`.
    pub fn pin(&mut self, root: usize, value: F) {
        assert!(self.is_root(root));
        self.parent[root] = Parent::Constant(value);
    }
}
