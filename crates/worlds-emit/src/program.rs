//! The emitter's output: memory contents plus ordered effects.

use smallvec::SmallVec;
use worlds_core::Offset;
use worlds_image::MemoryImage;

use crate::instr::Instruction;

/// One lowered transfer: store `value` at absolute address `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreOp {
    /// Transferred instance.
    pub instance: String,
    /// Destination world.
    pub world: String,
    /// Address of the instance's world-reference word.
    pub target: Offset,
    /// Offset of the destination world.
    pub value: Offset,
}

/// Field addresses carried by one narration call, resolved against the
/// memory as it stands after every transfer has run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrationCall {
    /// Narrated instance.
    pub instance: String,
    /// Address of the current world's name.
    pub world_name: Offset,
    /// Address of the species gene.
    pub animal_gene: Offset,
    /// Address of the species name.
    pub animal_name: Offset,
    /// Address of the instance name.
    pub instance_name: Offset,
    /// Address of the species sound.
    pub animal_sound: Offset,
}

impl NarrationCall {
    /// The five call arguments in wire order.
    pub fn args(&self) -> [u32; 5] {
        [
            self.world_name.get(),
            self.animal_gene.get(),
            self.animal_name.get(),
            self.instance_name.get(),
            self.animal_sound.get(),
        ]
    }
}

/// Everything the packaging step needs to produce a module.
#[derive(Clone, Debug)]
pub struct Program {
    /// Initial memory contents and the tables that address them.
    pub image: MemoryImage,
    /// Transfer effects, in declaration order.
    pub stores: Vec<StoreOp>,
    /// Narration calls, in instance declaration order.
    pub narrations: Vec<NarrationCall>,
    /// Entry function body: stores, then narration calls, then return.
    pub body: Vec<Instruction>,
    /// Initial and maximum memory page counts.
    pub pages: (u32, u32),
}

impl Program {
    /// Names of the narrated instances, in call order.
    pub fn narration_order(&self) -> SmallVec<[&str; 8]> {
        self.narrations.iter().map(|n| n.instance.as_str()).collect()
    }
}
