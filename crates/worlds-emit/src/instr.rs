//! Instruction trees for the emitted entry function.
//!
//! The body is a flat list of [`Instruction`]s whose operands are
//! [`Expr`] trees of 32-bit constants, loads, and additions. This is the
//! subset of the target's instruction set that address chains need, and
//! both the interpreter and the text renderer consume it.

use worlds_core::Offset;

/// A 32-bit integer expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Literal value.
    Const(u32),
    /// Little-endian load of the word at `addr + offset`.
    Load {
        /// Static displacement added to the address operand.
        offset: u32,
        /// Address operand.
        addr: Box<Expr>,
    },
    /// Wrapping addition.
    Add(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// A literal offset.
    pub fn offset(o: Offset) -> Self {
        Expr::Const(o.get())
    }

    /// Load the word at `addr`.
    pub fn load(addr: Expr) -> Self {
        Expr::load_at(0, addr)
    }

    /// Load the word at `addr + offset`.
    pub fn load_at(offset: u32, addr: Expr) -> Self {
        Expr::Load {
            offset,
            addr: Box::new(addr),
        }
    }

    /// `lhs + rhs`.
    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Expr::Add(Box::new(lhs), Box::new(rhs))
    }

    /// Absolute address of a header-described field: `base + load(base + slot)`.
    pub fn field(base: Expr, slot: u32) -> Self {
        Expr::add(base.clone(), Expr::load_at(slot, base))
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Const(_) => 1,
            Expr::Load { addr, .. } => 1 + addr.size(),
            Expr::Add(l, r) => 1 + l.size() + r.size(),
        }
    }
}

/// One statement of the entry function body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Store `value` to `addr + offset`.
    Store {
        /// Static displacement added to the address operand.
        offset: u32,
        /// Address operand.
        addr: Expr,
        /// Value to store.
        value: Expr,
    },
    /// Call the narration sink with five field addresses, in order: world
    /// name, animal gene, animal name, instance name, animal sound.
    Narrate(Box<[Expr; 5]>),
    /// Return `value` from the entry function.
    Return(Expr),
}
