use std::collections::HashMap;
use std::fmt;

/// Path quantifier of a past temporal operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quant {
    /// The operator holds along some backward path.
    Exists,
    /// The operator holds along every backward path.
    Forall,
}

impl Quant {
    fn letter(self) -> char {
        match self {
            Quant::Exists => 'E',
            Quant::Forall => 'A',
        }
    }
}

/// A past-time CTL (PCTL) formula over atomic propositions of type `V`.
///
/// The temporal operators look backward through the graph of global states:
/// `Yesterday` at the immediate predecessors, `Once` somewhere in the past,
/// `Historically` throughout the past, and `Since` with the usual "ψ held
/// at some point, and φ ever since" reading. Each comes in an existential
/// and a universal path-quantified form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pctl<V>
where
    V: Clone,
{
    /// The true formula.
    True,
    /// The false formula.
    False,
    /// An atomic proposition.
    Atom(V),
    /// Logical negation.
    Not(Box<Pctl<V>>),
    /// Logical conjunction.
    And(Box<(Pctl<V>, Pctl<V>)>),
    /// Logical disjunction.
    Or(Box<(Pctl<V>, Pctl<V>)>),
    /// Logical implication.
    Implies(Box<(Pctl<V>, Pctl<V>)>),
    /// Logical biconditional.
    Iff(Box<(Pctl<V>, Pctl<V>)>),
    /// The subformula held at an immediate predecessor state (`EY`/`AY`).
    Yesterday(Quant, Box<Pctl<V>>),
    /// The subformula held at some past state (`EP`/`AP`).
    Once(Quant, Box<Pctl<V>>),
    /// The subformula held at every state of the past (`EH`/`AH`).
    Historically(Quant, Box<Pctl<V>>),
    /// `E(φ S ψ)`/`A(φ S ψ)`: ψ held at some past state and φ has held
    /// ever since.
    Since(Quant, Box<(Pctl<V>, Pctl<V>)>),
}

// Binding strength, loosest to tightest. Parenthesized operands of the
// temporal operators restart from the bottom.
const PREC_IFF: u8 = 1;
const PREC_IMPLIES: u8 = 2;
const PREC_OR: u8 = 3;
const PREC_AND: u8 = 4;
const PREC_UNARY: u8 = 5;
const PREC_ATOM: u8 = 6;

impl<V> Pctl<V>
where
    V: Clone + fmt::Display,
{
    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        match self {
            Pctl::True => write!(f, "TRUE"),
            Pctl::False => write!(f, "FALSE"),
            Pctl::Atom(name) => write!(f, "{name}"),
            Pctl::Not(sub) => {
                if min > PREC_UNARY {
                    write!(f, "(")?;
                }
                write!(f, "!")?;
                sub.fmt_prec(f, PREC_UNARY)?;
                if min > PREC_UNARY {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Pctl::And(subs) => {
                if min > PREC_AND {
                    write!(f, "(")?;
                }
                subs.0.fmt_prec(f, PREC_AND)?;
                write!(f, " & ")?;
                subs.1.fmt_prec(f, PREC_AND + 1)?;
                if min > PREC_AND {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Pctl::Or(subs) => {
                if min > PREC_OR {
                    write!(f, "(")?;
                }
                subs.0.fmt_prec(f, PREC_OR)?;
                write!(f, " | ")?;
                subs.1.fmt_prec(f, PREC_OR + 1)?;
                if min > PREC_OR {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Pctl::Implies(subs) => {
                if min > PREC_IMPLIES {
                    write!(f, "(")?;
                }
                subs.0.fmt_prec(f, PREC_IMPLIES + 1)?;
                write!(f, " -> ")?;
                subs.1.fmt_prec(f, PREC_IMPLIES)?;
                if min > PREC_IMPLIES {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Pctl::Iff(subs) => {
                if min > PREC_IFF {
                    write!(f, "(")?;
                }
                subs.0.fmt_prec(f, PREC_IFF + 1)?;
                write!(f, " <-> ")?;
                subs.1.fmt_prec(f, PREC_IFF + 1)?;
                if min > PREC_IFF {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Pctl::Yesterday(quant, sub) => {
                write!(f, "{}Y(", quant.letter())?;
                sub.fmt_prec(f, 0)?;
                write!(f, ")")
            }
            Pctl::Once(quant, sub) => {
                write!(f, "{}P(", quant.letter())?;
                sub.fmt_prec(f, 0)?;
                write!(f, ")")
            }
            Pctl::Historically(quant, sub) => {
                write!(f, "{}H(", quant.letter())?;
                sub.fmt_prec(f, 0)?;
                write!(f, ")")
            }
            Pctl::Since(quant, subs) => {
                write!(f, "{}(", quant.letter())?;
                subs.0.fmt_prec(f, 0)?;
                write!(f, " S ")?;
                subs.1.fmt_prec(f, 0)?;
                write!(f, ")")
            }
        }
    }
}

impl<V> fmt::Display for Pctl<V>
where
    V: Clone + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

/// A single subformula in compiled form. Operands are indices into the
/// owning [`Property`]'s node vector, always smaller than the index of the
/// node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// The true formula.
    True,
    /// The false formula.
    False,
    /// Atomic proposition, by index into the property's atom table.
    Atom(usize),
    /// Negation.
    Not(usize),
    /// Conjunction.
    And(usize, usize),
    /// Disjunction.
    Or(usize, usize),
    /// Implication.
    Implies(usize, usize),
    /// Biconditional.
    Iff(usize, usize),
    /// Quantified yesterday.
    Yesterday(Quant, usize),
    /// Quantified once-in-the-past.
    Once(Quant, usize),
    /// Quantified historically.
    Historically(Quant, usize),
    /// Quantified since.
    Since(Quant, usize, usize),
}

/// A PCTL property compiled for evaluation.
///
/// Atoms are interned into an index table and structurally equal
/// subformulae are shared, so that a global state's verdict cache is a
/// plain boolean vector indexed by subformula. Nodes are stored children
/// first, which lets the evaluator run a single bottom-up pass.
#[derive(Debug, Clone)]
pub struct Property {
    atoms: Vec<String>,
    nodes: Vec<Op>,
    root: usize,
}

impl Property {
    /// Compiles a parsed formula.
    pub fn compile(formula: &Pctl<String>) -> Self {
        let mut atoms = Vec::new();
        let mut nodes = Vec::new();
        let mut memo = HashMap::new();
        let root = intern(formula, &mut atoms, &mut nodes, &mut memo);
        Self { atoms, nodes, root }
    }

    /// The property's atomic propositions, in interning order.
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    /// The deduplicated subformulae, children before parents.
    pub fn nodes(&self) -> &[Op] {
        &self.nodes
    }

    /// Index of the whole formula among [`Self::nodes`].
    pub fn root(&self) -> usize {
        self.root
    }

    /// Evaluates every subformula at one global state, given the state's
    /// atom valuation and the cached subformula verdicts of its immediate
    /// predecessors. A single bottom-up pass over the node vector; the
    /// temporal operators read their own slot in the predecessors' caches.
    pub(crate) fn evaluate(
        &self,
        labels: &[bool],
        root_state: bool,
        predecessors: &[&[bool]],
    ) -> Box<[bool]> {
        debug_assert_eq!(labels.len(), self.atoms.len());
        debug_assert!(root_state || !predecessors.is_empty());
        let mut now: Vec<bool> = Vec::with_capacity(self.nodes.len());
        for (this, op) in self.nodes.iter().enumerate() {
            let value = match *op {
                Op::True => true,
                Op::False => false,
                Op::Atom(atom) => labels[atom],
                Op::Not(sub) => !now[sub],
                Op::And(lhs, rhs) => now[lhs] && now[rhs],
                Op::Or(lhs, rhs) => now[lhs] || now[rhs],
                Op::Implies(lhs, rhs) => !now[lhs] || now[rhs],
                Op::Iff(lhs, rhs) => now[lhs] == now[rhs],
                Op::Yesterday(Quant::Exists, sub) => {
                    predecessors.iter().any(|pre| pre[sub])
                }
                // Vacuously true at the root state.
                Op::Yesterday(Quant::Forall, sub) => {
                    root_state || predecessors.iter().all(|pre| pre[sub])
                }
                Op::Once(Quant::Exists, sub) => {
                    now[sub] || predecessors.iter().any(|pre| pre[this])
                }
                Op::Once(Quant::Forall, sub) => {
                    now[sub] || (!root_state && predecessors.iter().all(|pre| pre[this]))
                }
                Op::Historically(Quant::Exists, sub) => {
                    now[sub] && (root_state || predecessors.iter().any(|pre| pre[this]))
                }
                Op::Historically(Quant::Forall, sub) => {
                    now[sub] && (root_state || predecessors.iter().all(|pre| pre[this]))
                }
                Op::Since(Quant::Exists, lhs, rhs) => {
                    now[rhs] || (now[lhs] && predecessors.iter().any(|pre| pre[this]))
                }
                Op::Since(Quant::Forall, lhs, rhs) => {
                    now[rhs]
                        || (now[lhs]
                            && !root_state
                            && predecessors.iter().all(|pre| pre[this]))
                }
            };
            now.push(value);
        }
        now.into_boxed_slice()
    }
}

fn intern(
    formula: &Pctl<String>,
    atoms: &mut Vec<String>,
    nodes: &mut Vec<Op>,
    memo: &mut HashMap<Op, usize>,
) -> usize {
    let op = match formula {
        Pctl::True => Op::True,
        Pctl::False => Op::False,
        Pctl::Atom(name) => {
            let atom = atoms
                .iter()
                .position(|a| a == name)
                .unwrap_or_else(|| {
                    atoms.push(name.clone());
                    atoms.len() - 1
                });
            Op::Atom(atom)
        }
        Pctl::Not(sub) => Op::Not(intern(sub, atoms, nodes, memo)),
        Pctl::And(subs) => Op::And(
            intern(&subs.0, atoms, nodes, memo),
            intern(&subs.1, atoms, nodes, memo),
        ),
        Pctl::Or(subs) => Op::Or(
            intern(&subs.0, atoms, nodes, memo),
            intern(&subs.1, atoms, nodes, memo),
        ),
        Pctl::Implies(subs) => Op::Implies(
            intern(&subs.0, atoms, nodes, memo),
            intern(&subs.1, atoms, nodes, memo),
        ),
        Pctl::Iff(subs) => Op::Iff(
            intern(&subs.0, atoms, nodes, memo),
            intern(&subs.1, atoms, nodes, memo),
        ),
        Pctl::Yesterday(quant, sub) => Op::Yesterday(*quant, intern(sub, atoms, nodes, memo)),
        Pctl::Once(quant, sub) => Op::Once(*quant, intern(sub, atoms, nodes, memo)),
        Pctl::Historically(quant, sub) => {
            Op::Historically(*quant, intern(sub, atoms, nodes, memo))
        }
        Pctl::Since(quant, subs) => Op::Since(
            *quant,
            intern(&subs.0, atoms, nodes, memo),
            intern(&subs.1, atoms, nodes, memo),
        ),
    };
    if let Some(&index) = memo.get(&op) {
        index
    } else {
        nodes.push(op);
        memo.insert(op, nodes.len() - 1);
        nodes.len() - 1
    }
}
