//! Labels: symbolic code offsets that may be referenced before they are bound.
//!
//! A [`Label`] is a small `Copy` handle into a label arena owned by the
//! assembler. Each slot stores the bound position (if any) and the list of
//! reference sites that were emitted while the label was still unbound.
//! Binding walks that list and asks the target's
//! [`InstructionEncoder`](crate::encoder::InstructionEncoder) to patch every
//! site with the now-known displacement.

use alloc::vec::Vec;
use core::fmt;

use crate::buffer::CodeBuffer;
use crate::encoder::InstructionEncoder;
use crate::error::AsmError;

/// Handle to a position in the code being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label(u32);

impl Label {
    /// Build a handle from a raw arena index.
    pub const fn from_index(index: u32) -> Self {
        Label(index)
    }

    /// The raw arena index.
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// An unresolved reference site: the byte offset of the referencing
/// instruction and how its displacement field is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelUse<F> {
    /// Byte offset of the referencing instruction in the code buffer.
    pub offset: usize,
    /// Encoding of the displacement field to patch.
    pub kind: F,
}

#[derive(Debug, Clone)]
struct Slot<F> {
    position: Option<usize>,
    uses: Vec<LabelUse<F>>,
}

/// Label arena.
#[derive(Debug, Clone)]
pub struct Labels<F> {
    slots: Vec<Slot<F>>,
}

impl<F> Default for Labels<F> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<F: Copy + fmt::Debug> Labels<F> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh, unbound label.
    pub fn create(&mut self) -> Label {
        let label = Label(self.slots.len() as u32);
        self.slots.push(Slot {
            position: None,
            uses: Vec::new(),
        });
        label
    }

    /// Number of labels allocated so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no label has been allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, label: Label) -> Option<&Slot<F>> {
        self.slots.get(label.0 as usize)
    }

    fn slot_mut(&mut self, label: Label) -> Result<&mut Slot<F>, AsmError> {
        self.slots
            .get_mut(label.0 as usize)
            .ok_or(AsmError::UnboundLabel { label })
    }

    /// Whether `label` has been bound.
    pub fn is_bound(&self, label: Label) -> bool {
        self.slot(label).is_some_and(|s| s.position.is_some())
    }

    /// The bound position of `label`, or `None` while unbound.
    pub fn bound_position(&self, label: Label) -> Option<usize> {
        self.slot(label).and_then(|s| s.position)
    }

    /// The bound position of `label`.
    ///
    /// # Errors
    ///
    /// [`AsmError::UnboundLabel`] if the label has not been bound yet.
    pub fn position(&self, label: Label) -> Result<usize, AsmError> {
        self.bound_position(label)
            .ok_or(AsmError::UnboundLabel { label })
    }

    /// Number of reference sites still waiting for `label` to be bound, or
    /// that a failed [`Labels::bind`] could not patch.
    pub fn pending(&self, label: Label) -> usize {
        self.slot(label).map_or(0, |s| s.uses.len())
    }

    /// The reference sites still waiting for `label`.
    pub fn uses(&self, label: Label) -> &[LabelUse<F>] {
        self.slot(label).map_or(&[], |s| s.uses.as_slice())
    }

    /// Number of labels that still have unpatched reference sites.
    pub fn unresolved(&self) -> usize {
        self.slots.iter().filter(|s| !s.uses.is_empty()).count()
    }

    /// Record a reference to an unbound label.
    ///
    /// # Errors
    ///
    /// [`AsmError::LabelAlreadyBound`] if `label` is bound: references to
    /// bound labels must be encoded with their final displacement instead.
    pub fn add_use(&mut self, label: Label, offset: usize, kind: F) -> Result<(), AsmError> {
        let slot = self.slot_mut(label)?;
        if slot.position.is_some() {
            return Err(AsmError::LabelAlreadyBound { label });
        }
        slot.uses.push(LabelUse { offset, kind });
        Ok(())
    }

    /// Bind `label` to the current end of `buffer` and patch every pending
    /// reference site. Returns the number of patched sites.
    ///
    /// # Errors
    ///
    /// [`AsmError::LabelAlreadyBound`] when rebinding, or the first error the
    /// encoder reports while patching (typically
    /// [`AsmError::BranchOutOfRange`]). Every other site is still patched;
    /// the failed ones stay pending so [`Labels::unresolved`] counts them.
    pub fn bind<E>(
        &mut self,
        label: Label,
        buffer: &mut CodeBuffer,
        encoder: &E,
    ) -> Result<usize, AsmError>
    where
        E: InstructionEncoder<Fixup = F>,
    {
        let position = buffer.len();
        let slot = self.slot_mut(label)?;
        if slot.position.is_some() {
            return Err(AsmError::LabelAlreadyBound { label });
        }
        slot.position = Some(position);
        let uses = core::mem::take(&mut slot.uses);
        let mut patched = 0;
        let mut first_error = None;
        for site in uses {
            log::trace!(
                "patch {:?} at {:#x} -> {} ({:#x})",
                site.kind,
                site.offset,
                label,
                position
            );
            match encoder.apply_fixup(buffer, site.offset, site.kind, position) {
                Ok(()) => patched += 1,
                Err(err) => {
                    log::debug!("{} at {:#x}: {}", label, site.offset, err);
                    slot.uses.push(site);
                    first_error.get_or_insert(err);
                }
            }
        }
        log::trace!(
            "bind {} at {:#x}, {} site(s) patched, {} failed",
            label,
            position,
            patched,
            slot.uses.len()
        );
        match first_error {
            Some(err) => Err(err),
            None => Ok(patched),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchName;

    /// Toy encoder: a fixup is a 4-byte little-endian absolute position.
    struct Absolute;

    impl InstructionEncoder for Absolute {
        type Fixup = ();

        fn arch(&self) -> ArchName {
            ArchName::Rv64
        }

        fn min_instruction_size(&self) -> usize {
            1
        }

        fn apply_fixup(
            &self,
            buffer: &mut CodeBuffer,
            site: usize,
            _kind: (),
            target: usize,
        ) -> Result<(), AsmError> {
            buffer.write_u32(site, target as u32)
        }

        fn emit_padding(&self, buffer: &mut CodeBuffer, len: usize) -> Result<(), AsmError> {
            for _ in 0..len {
                buffer.emit_instruction(&[0]);
            }
            Ok(())
        }
    }

    #[test]
    fn fresh_label_is_unbound() {
        let mut labels: Labels<()> = Labels::new();
        let l = labels.create();
        assert!(!labels.is_bound(l));
        assert_eq!(labels.position(l), Err(AsmError::UnboundLabel { label: l }));
        assert_eq!(labels.pending(l), 0);
    }

    #[test]
    fn bind_patches_every_site() {
        let mut labels: Labels<()> = Labels::new();
        let mut buf = CodeBuffer::new();
        let l = labels.create();
        for _ in 0..3 {
            let at = buf.len();
            buf.emit_instruction(&[0, 0, 0, 0]);
            labels.add_use(l, at, ()).unwrap();
        }
        assert_eq!(labels.pending(l), 3);
        assert_eq!(labels.unresolved(), 1);
        let patched = labels.bind(l, &mut buf, &Absolute).unwrap();
        assert_eq!(patched, 3);
        assert_eq!(labels.pending(l), 0);
        assert_eq!(labels.unresolved(), 0);
        for site in [0, 4, 8] {
            assert_eq!(buf.read_u32(site).unwrap(), 12);
        }
    }

    /// Toy encoder whose `true` fixups never fit.
    struct Picky;

    impl InstructionEncoder for Picky {
        type Fixup = bool;

        fn arch(&self) -> ArchName {
            ArchName::Rv64
        }

        fn min_instruction_size(&self) -> usize {
            1
        }

        fn apply_fixup(
            &self,
            buffer: &mut CodeBuffer,
            site: usize,
            too_far: bool,
            target: usize,
        ) -> Result<(), AsmError> {
            if too_far {
                return Err(AsmError::BranchOutOfRange {
                    at: site,
                    disp: (target - site) as i64,
                    max: 0,
                });
            }
            buffer.write_u32(site, target as u32)
        }

        fn emit_padding(&self, buffer: &mut CodeBuffer, len: usize) -> Result<(), AsmError> {
            Absolute.emit_padding(buffer, len)
        }
    }

    #[test]
    fn failed_site_stays_pending() {
        let mut labels: Labels<bool> = Labels::new();
        let mut buf = CodeBuffer::new();
        let l = labels.create();
        for too_far in [true, false] {
            let at = buf.len();
            buf.emit_instruction(&[0, 0, 0, 0]);
            labels.add_use(l, at, too_far).unwrap();
        }
        assert_eq!(
            labels.bind(l, &mut buf, &Picky),
            Err(AsmError::BranchOutOfRange { at: 0, disp: 8, max: 0 })
        );
        assert_eq!(buf.read_u32(4).unwrap(), 8);
        assert!(labels.is_bound(l));
        assert_eq!(labels.pending(l), 1);
        assert_eq!(labels.uses(l), &[LabelUse { offset: 0, kind: true }]);
        assert_eq!(labels.unresolved(), 1);
    }

    #[test]
    fn position_is_stable() {
        let mut labels: Labels<()> = Labels::new();
        let mut buf = CodeBuffer::new();
        buf.emit_instruction(&[1, 2]);
        let l = labels.create();
        labels.bind(l, &mut buf, &Absolute).unwrap();
        for _ in 0..4 {
            assert_eq!(labels.position(l), Ok(2));
        }
    }

    #[test]
    fn rebinding_is_rejected() {
        let mut labels: Labels<()> = Labels::new();
        let mut buf = CodeBuffer::new();
        let l = labels.create();
        labels.bind(l, &mut buf, &Absolute).unwrap();
        assert_eq!(
            labels.bind(l, &mut buf, &Absolute),
            Err(AsmError::LabelAlreadyBound { label: l })
        );
    }

    #[test]
    fn use_of_bound_label_is_rejected() {
        let mut labels: Labels<()> = Labels::new();
        let mut buf = CodeBuffer::new();
        let l = labels.create();
        labels.bind(l, &mut buf, &Absolute).unwrap();
        assert!(labels.add_use(l, 0, ()).is_err());
    }

    #[test]
    fn foreign_label_is_unbound() {
        let labels: Labels<()> = Labels::new();
        let l = Label::from_index(42);
        assert!(!labels.is_bound(l));
        assert!(labels.position(l).is_err());
    }

    #[test]
    fn label_display() {
        assert_eq!(alloc::format!("{}", Label::from_index(7)), "L7");
    }
}
