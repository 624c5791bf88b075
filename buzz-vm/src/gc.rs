//! Tracing mark-and-sweep with a young/old generational split. Grounded
//! in chalk's approach to process-wide mutable state — pass it through
//! an explicit runtime context rather than rely on ambient globals —
//! `Heap` is an explicit value threaded
//! through the interpreter and fiber scheduler, not a `static`.

use std::ptr::NonNull;

use buzz_ir::object::{ObjHeader, ObjKind};
use buzz_ir::value::ObjRef;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::RuntimeError;
use crate::heap;
use crate::roots::RootSource;

#[derive(Copy, Clone, Debug)]
pub struct GcConfig {
    pub young_threshold_bytes: usize,
    pub young_gc_count: u32,
    /// Hard ceiling on live heap bytes. `None` means unbounded. Exceeding it
    /// even after a full collection surfaces as
    /// `RuntimeError::AllocationFailed` rather than growing without limit.
    pub max_heap_bytes: Option<usize>,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            young_threshold_bytes: 1 << 20,
            young_gc_count: 8,
            max_heap_bytes: None,
        }
    }
}

impl GcConfig {
    /// Reads `BUZZ_GC_YOUNG_BYTES` / `BUZZ_GC_YOUNG_CYCLES` /
    /// `BUZZ_GC_MAX_BYTES`, falling back to the collector's built-in
    /// defaults.
    pub fn from_env() -> Self {
        let mut cfg = GcConfig::default();
        if let Ok(v) = std::env::var("BUZZ_GC_YOUNG_BYTES") {
            if let Ok(n) = v.parse() {
                cfg.young_threshold_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("BUZZ_GC_YOUNG_CYCLES") {
            if let Ok(n) = v.parse() {
                cfg.young_gc_count = n;
            }
        }
        if let Ok(v) = std::env::var("BUZZ_GC_MAX_BYTES") {
            if let Ok(n) = v.parse() {
                cfg.max_heap_bytes = Some(n);
            }
        }
        cfg
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct GcStats {
    pub young_collections: u64,
    pub full_collections: u64,
    pub bytes_freed: u64,
}

/// The GC heap. Owns every live object; `ObjRef`s handed out elsewhere are
/// only valid while the objects they point to remain reachable from the
/// roots passed to [`Heap::collect`].
pub struct Heap {
    config: GcConfig,
    young: Vec<NonNull<ObjHeader>>,
    old: Vec<NonNull<ObjHeader>>,
    dirty: FxHashSet<usize>,
    bytes_since_young_gc: usize,
    young_collections_since_full: u32,
    /// Total bytes currently live across both generations, maintained
    /// incrementally so `max_heap_bytes` can be checked without a full scan.
    live_bytes: usize,
    stats: GcStats,
}

// SAFETY: `Heap` is only ever driven from the single thread running the
// active fiber; it holds raw
// pointers but never shares them across threads.
unsafe impl Send for Heap {}

impl Heap {
    pub fn new(config: GcConfig) -> Self {
        Heap {
            config,
            young: Vec::new(),
            old: Vec::new(),
            dirty: FxHashSet::default(),
            bytes_since_young_gc: 0,
            young_collections_since_full: 0,
            live_bytes: 0,
            stats: GcStats::default(),
        }
    }

    pub fn stats(&self) -> GcStats {
        self.stats
    }

    /// Allocates `value` fresh into the young generation. May trigger a
    /// collection first if the young-generation threshold has been crossed.
    ///
    /// # Failure semantics
    /// If `config.max_heap_bytes` is set and the allocation would still
    /// exceed it after a full collection has had a chance to reclaim dead
    /// objects, returns `RuntimeError::AllocationFailed` instead of
    /// allocating. The caller (the interpreter loop, or a native via its
    /// `NativeContext`) is responsible for surfacing that as a thrown
    /// exception on the active fiber rather than growing the heap
    /// unboundedly.
    pub fn allocate<T>(&mut self, roots: &dyn RootSource, value: T) -> Result<ObjRef, RuntimeError>
    where
        T: HasHeader,
    {
        let size = std::mem::size_of::<T>();
        if self.bytes_since_young_gc + size > self.config.young_threshold_bytes {
            self.collect_young(roots);
        }
        if let Some(limit) = self.config.max_heap_bytes {
            if self.live_bytes + size > limit {
                self.collect_full(roots);
                if self.live_bytes + size > limit {
                    return Err(RuntimeError::AllocationFailed);
                }
            }
        }

        let boxed = Box::new(value);
        let raw = Box::into_raw(boxed);
        let header_ptr = unsafe { NonNull::new_unchecked(raw as *mut ObjHeader) };
        self.young.push(header_ptr);
        self.bytes_since_young_gc += size;
        self.live_bytes += size;

        // SAFETY: header_ptr was just derived from a live `T` whose first
        // field is `ObjHeader` (enforced by the `HasHeader` bound).
        Ok(unsafe { ObjRef::from_raw(header_ptr) })
    }

    /// Write barrier: call after storing
    /// `child` into a field of `parent` that the GC already tracks.
    pub fn mark_dirty(&mut self, parent: ObjRef) {
        if matches!(parent.header().gen_link.get(), buzz_ir::object::GenLink::Old) {
            parent.header().dirty.set(true);
            self.dirty.insert(parent.as_ptr().as_ptr() as usize);
        }
    }

    /// Runs a young collection: traces roots plus the dirty old-set,
    /// reclaims unreachable young objects, and promotes survivors.
    pub fn collect_young(&mut self, roots: &dyn RootSource) {
        debug!(young_count = self.young.len(), "starting young gc");
        let mut worklist = Vec::new();
        roots.trace_roots(&mut worklist);
        for ptr in self.dirty_refs() {
            worklist.push(unsafe { ObjRef::from_raw(ptr) });
        }
        self.mark(worklist);

        let mut freed = 0u64;
        for ptr in std::mem::take(&mut self.young) {
            let obj = unsafe { ObjRef::from_raw(ptr) };
            if obj.header().marked.get() {
                obj.header().marked.set(false);
                obj.header().gen_link.set(buzz_ir::object::GenLink::Old);
                self.old.push(ptr);
            } else {
                let size = heap::size_of_kind(obj.kind()) as u64;
                unsafe { heap::deinit(obj) };
                self.live_bytes -= size as usize;
                freed += size;
            }
        }
        self.stats.young_collections += 1;
        self.stats.bytes_freed += freed;
        self.bytes_since_young_gc = 0;
        self.clear_dirty_marks();

        self.young_collections_since_full += 1;
        if self.young_collections_since_full >= self.config.young_gc_count {
            self.collect_full(roots);
        }
    }

    /// A full collection: traces from roots only (the dirty set exists to
    /// approximate old→young edges between young collections and is
    /// redundant once every object is re-examined).
    pub fn collect_full(&mut self, roots: &dyn RootSource) {
        debug!(old_count = self.old.len(), "starting full gc");
        let mut worklist = Vec::new();
        roots.trace_roots(&mut worklist);
        self.mark(worklist);

        let mut freed = 0u64;
        for ptr in std::mem::take(&mut self.old) {
            let obj = unsafe { ObjRef::from_raw(ptr) };
            if obj.header().marked.get() {
                obj.header().marked.set(false);
                self.old.push(ptr);
            } else {
                let size = heap::size_of_kind(obj.kind()) as u64;
                unsafe { heap::deinit(obj) };
                self.live_bytes -= size as usize;
                freed += size;
            }
        }
        self.stats.full_collections += 1;
        self.stats.bytes_freed += freed;
        self.young_collections_since_full = 0;
        self.dirty.clear();
    }

    /// Depth-first mark from a worklist of roots.
    /// Cycles are safe: an object already marked is never re-entered.
    fn mark(&self, mut worklist: Vec<ObjRef>) {
        while let Some(obj) = worklist.pop() {
            if obj.header().marked.get() {
                continue;
            }
            obj.header().marked.set(true);
            heap::referents(obj, &mut worklist);
        }
    }

    fn dirty_refs(&self) -> impl Iterator<Item = NonNull<ObjHeader>> + '_ {
        self.dirty
            .iter()
            .map(|&addr| unsafe { NonNull::new_unchecked(addr as *mut ObjHeader) })
    }

    fn clear_dirty_marks(&mut self) {
        for &addr in &self.dirty {
            let ptr = unsafe { NonNull::new_unchecked(addr as *mut ObjHeader) };
            unsafe { ptr.as_ref() }.dirty.set(false);
        }
        self.dirty.clear();
    }
}

/// Marker for types allocatable via [`Heap::allocate`]: the first field
/// must be `ObjHeader` so `heap::cast` can reinterpret a `NonNull<ObjHeader>`
/// back into `Self`.
///
/// # Safety
/// Implementors must be `#[repr(C)]` with `header: ObjHeader` as the first
/// field, and must report the matching `ObjKind`.
pub unsafe trait HasHeader {
    const KIND: ObjKind;
}

macro_rules! has_header {
    ($ty:ty, $kind:expr) => {
        unsafe impl HasHeader for $ty {
            const KIND: ObjKind = $kind;
        }
    };
}

has_header!(buzz_ir::object::ObjString, ObjKind::String);
has_header!(buzz_ir::object::ObjPattern, ObjKind::Pattern);
has_header!(buzz_ir::object::ObjType, ObjKind::Type);
has_header!(buzz_ir::object::ObjUpValue, ObjKind::UpValue);
has_header!(buzz_ir::object::ObjClosure, ObjKind::Closure);
has_header!(buzz_ir::object::ObjFunction, ObjKind::Function);
has_header!(buzz_ir::object::ObjObject, ObjKind::Object);
has_header!(buzz_ir::object::ObjObjectInstance, ObjKind::ObjectInstance);
has_header!(buzz_ir::object::ObjList, ObjKind::List);
has_header!(buzz_ir::object::ObjMap, ObjKind::Map);
has_header!(buzz_ir::object::ObjEnum, ObjKind::Enum);
has_header!(buzz_ir::object::ObjEnumInstance, ObjKind::EnumInstance);
has_header!(buzz_ir::object::ObjBound, ObjKind::Bound);
has_header!(buzz_ir::object::ObjNative, ObjKind::Native);
has_header!(buzz_ir::object::ObjUserData, ObjKind::UserData);
has_header!(crate::fiber::ObjFiber, ObjKind::Fiber);
