//! `ArenaHeap`: the one concrete implementation of every collaborator
//! trait, analogous to the teacher's `MemoryStorage`
//! (`storage/memory.rs`) — an in-process, `HashMap`-backed
//! `InterpreterStorage` good enough to run the interpreter end to end in
//! tests without a real blockchain node behind it. `ArenaHeap` plays the
//! same role here: a real, working, but deliberately simple GC (nothing
//! is ever actually reclaimed), object model, string engine, big-integer
//! engine, native-call bridge, and profiler, all backed by plain
//! collections.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::collaborators::bigint::{BigIntEngine, BigIntVal, DefaultBigIntEngine};
use crate::collaborators::gc::{Gc, TempRootToken};
use crate::collaborators::native::{ExtensionEntry, ExtensionFn, NativeAccess, NativeCallBridge};
use crate::collaborators::object_model::{ObjRef, ObjectModel, TypeRef};
use crate::collaborators::profiler::{ProfileLocation, Profiler};
use crate::collaborators::strings::{StrRef, StringEngine};
use crate::error::{AdhocError, RuntimeError, VmPanic};

#[derive(Debug, Default)]
struct ArenaObject {
    ty: TypeRef,
    ints: HashMap<String, i64>,
    nums: HashMap<String, f64>,
    strs: HashMap<String, Option<u32>>,
    objs: HashMap<String, ObjRef>,
    positional: Vec<ObjRef>,
    assoc: HashMap<String, ObjRef>,
}

#[derive(Debug, Default)]
struct ArenaType {
    methods: HashMap<String, ObjRef>,
    parent: Option<TypeRef>,
}

/// A single-process heap: objects, types, and the interned string table
/// all live in plain `Vec`s, indexed by the low bits of the opaque
/// `ObjRef`/`TypeRef`/`StrRef` handles (index + 1, so 0 stays the null
/// sentinel).
#[derive(Debug, Default)]
pub struct ArenaHeap {
    objects: Vec<ArenaObject>,
    types: Vec<ArenaType>,
    strings: Vec<String>,
    const_table: Vec<String>,
    temp_roots: usize,
    bigint: DefaultBigIntEngine,
    spesh_slots: HashMap<u16, crate::register::Register>,
}

impl ArenaHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a string in the compilation unit's constant table,
    /// returning the index `const_s`/`die`/attribute-name operands refer
    /// to. Test and loader setup use this to populate the table before
    /// execution starts.
    pub fn intern_constant(&mut self, s: impl Into<String>) -> u32 {
        self.const_table.push(s.into());
        (self.const_table.len() - 1) as u32
    }

    /// Registers a fresh type with no parent and an empty method table,
    /// returning its handle.
    pub fn define_type(&mut self) -> TypeRef {
        self.types.push(ArenaType::default());
        TypeRef::from_bits(self.types.len() as u64)
    }

    pub fn add_method(&mut self, ty: TypeRef, name: impl Into<String>, method: ObjRef) {
        if let Some(t) = self.type_mut(ty) {
            t.methods.insert(name.into(), method);
        }
    }

    fn type_mut(&mut self, ty: TypeRef) -> Option<&mut ArenaType> {
        let idx = ty.to_bits().checked_sub(1)? as usize;
        self.types.get_mut(idx)
    }

    fn type_ref(&self, ty: TypeRef) -> Result<&ArenaType, VmPanic> {
        let idx = ty.to_bits().checked_sub(1).ok_or(VmPanic::MalformedOperand)? as usize;
        self.types.get(idx).ok_or(VmPanic::MalformedOperand)
    }

    fn obj_mut(&mut self, obj: ObjRef) -> Result<&mut ArenaObject, RuntimeError> {
        let idx = obj
            .to_bits()
            .checked_sub(1)
            .ok_or_else(|| AdhocError::new("use of a null object reference"))? as usize;
        self.objects
            .get_mut(idx)
            .ok_or_else(|| AdhocError::new("dangling object reference").into())
    }

    fn obj_ref(&self, obj: ObjRef) -> Result<&ArenaObject, RuntimeError> {
        let idx = obj
            .to_bits()
            .checked_sub(1)
            .ok_or_else(|| AdhocError::new("use of a null object reference"))? as usize;
        self.objects
            .get(idx)
            .ok_or_else(|| AdhocError::new("dangling object reference").into())
    }

    fn str_text(&self, s: StrRef) -> Result<&str, RuntimeError> {
        let idx = s
            .to_bits()
            .checked_sub(1)
            .ok_or_else(|| AdhocError::new("use of a null string reference"))? as usize;
        self.strings
            .get(idx)
            .map(|s| s.as_str())
            .ok_or_else(|| AdhocError::new("dangling string reference").into())
    }

    fn intern(&mut self, s: String) -> StrRef {
        self.strings.push(s);
        StrRef::from_bits(self.strings.len() as u64)
    }
}

impl Gc for ArenaHeap {
    fn safepoint(&mut self) {}

    fn write_barrier(&mut self, _holder: ObjRef, _referent: ObjRef) {}

    fn assert_not_from_space(&self, _obj: ObjRef) {}

    fn root_temp(&mut self, _obj: ObjRef) -> TempRootToken {
        self.temp_roots += 1;
        TempRootToken(self.temp_roots)
    }

    fn unroot_temp(&mut self, _token: TempRootToken) {
        self.temp_roots = self.temp_roots.saturating_sub(1);
    }

    fn speshslot(&self, slot: u16) -> Result<crate::register::Register, RuntimeError> {
        Ok(self.spesh_slots.get(&slot).copied().unwrap_or_default())
    }

    fn set_speshslot(&mut self, slot: u16, value: crate::register::Register) -> Result<(), RuntimeError> {
        self.spesh_slots.insert(slot, value);
        Ok(())
    }
}

impl ObjectModel for ArenaHeap {
    fn create(&mut self, ty: TypeRef) -> Result<ObjRef, RuntimeError> {
        self.objects.push(ArenaObject {
            ty,
            ..Default::default()
        });
        Ok(ObjRef::from_bits(self.objects.len() as u64))
    }

    fn clone_obj(&mut self, obj: ObjRef) -> Result<ObjRef, RuntimeError> {
        let copy = ArenaObject {
            ty: self.obj_ref(obj)?.ty,
            ints: self.obj_ref(obj)?.ints.clone(),
            nums: self.obj_ref(obj)?.nums.clone(),
            strs: self.obj_ref(obj)?.strs.clone(),
            objs: self.obj_ref(obj)?.objs.clone(),
            positional: self.obj_ref(obj)?.positional.clone(),
            assoc: self.obj_ref(obj)?.assoc.clone(),
        };
        self.objects.push(copy);
        Ok(ObjRef::from_bits(self.objects.len() as u64))
    }

    fn type_of(&self, obj: ObjRef) -> Result<TypeRef, VmPanic> {
        Ok(self
            .obj_ref(obj)
            .map_err(|_| VmPanic::MalformedOperand)?
            .ty)
    }

    fn what_of(&self, obj: ObjRef) -> Result<TypeRef, VmPanic> {
        self.type_of(obj)
    }

    fn is_type(&self, obj: ObjRef, ty: TypeRef) -> Result<bool, VmPanic> {
        let mut cur = Some(self.type_of(obj)?);
        while let Some(c) = cur {
            if c == ty {
                return Ok(true);
            }
            cur = self.type_ref(c)?.parent;
        }
        Ok(false)
    }

    fn rebless(&mut self, obj: ObjRef, new_type: TypeRef) -> Result<(), RuntimeError> {
        self.obj_mut(obj)?.ty = new_type;
        Ok(())
    }

    fn get_attr_int(&self, obj: ObjRef, name: &str) -> Result<i64, RuntimeError> {
        Ok(*self.obj_ref(obj)?.ints.get(name).unwrap_or(&0))
    }

    fn get_attr_num(&self, obj: ObjRef, name: &str) -> Result<f64, RuntimeError> {
        Ok(*self.obj_ref(obj)?.nums.get(name).unwrap_or(&0.0))
    }

    fn get_attr_str(&self, obj: ObjRef, name: &str) -> Result<Option<u32>, RuntimeError> {
        Ok(self.obj_ref(obj)?.strs.get(name).copied().flatten())
    }

    fn get_attr_obj(&self, obj: ObjRef, name: &str) -> Result<ObjRef, RuntimeError> {
        Ok(*self.obj_ref(obj)?.objs.get(name).unwrap_or(&ObjRef::NULL))
    }

    fn bind_attr_int(&mut self, obj: ObjRef, name: &str, v: i64) -> Result<(), RuntimeError> {
        self.obj_mut(obj)?.ints.insert(name.to_string(), v);
        Ok(())
    }

    fn bind_attr_num(&mut self, obj: ObjRef, name: &str, v: f64) -> Result<(), RuntimeError> {
        self.obj_mut(obj)?.nums.insert(name.to_string(), v);
        Ok(())
    }

    fn bind_attr_str(&mut self, obj: ObjRef, name: &str, v: Option<u32>) -> Result<(), RuntimeError> {
        self.obj_mut(obj)?.strs.insert(name.to_string(), v);
        Ok(())
    }

    fn bind_attr_obj(&mut self, obj: ObjRef, name: &str, v: ObjRef) -> Result<(), RuntimeError> {
        self.obj_mut(obj)?.objs.insert(name.to_string(), v);
        Ok(())
    }

    fn at_pos(&self, obj: ObjRef, index: i64) -> Result<ObjRef, RuntimeError> {
        let idx = usize::try_from(index).map_err(|_| AdhocError::new("negative positional index"))?;
        Ok(*self
            .obj_ref(obj)?
            .positional
            .get(idx)
            .unwrap_or(&ObjRef::NULL))
    }

    fn bind_pos(&mut self, obj: ObjRef, index: i64, v: ObjRef) -> Result<(), RuntimeError> {
        let idx = usize::try_from(index).map_err(|_| AdhocError::new("negative positional index"))?;
        let positional = &mut self.obj_mut(obj)?.positional;
        if idx >= positional.len() {
            positional.resize(idx + 1, ObjRef::NULL);
        }
        positional[idx] = v;
        Ok(())
    }

    fn at_key(&self, obj: ObjRef, key: ObjRef) -> Result<ObjRef, RuntimeError> {
        let key_str = format!("{:?}", key);
        Ok(*self.obj_ref(obj)?.assoc.get(&key_str).unwrap_or(&ObjRef::NULL))
    }

    fn bind_key(&mut self, obj: ObjRef, key: ObjRef, v: ObjRef) -> Result<(), RuntimeError> {
        let key_str = format!("{:?}", key);
        self.obj_mut(obj)?.assoc.insert(key_str, v);
        Ok(())
    }

    fn find_method(&self, obj: ObjRef, name: &str) -> Result<ObjRef, VmPanic> {
        let mut cur = Some(self.type_of(obj)?);
        while let Some(c) = cur {
            let t = self.type_ref(c)?;
            if let Some(m) = t.methods.get(name) {
                return Ok(*m);
            }
            cur = t.parent;
        }
        Ok(ObjRef::NULL)
    }
}

impl StringEngine for ArenaHeap {
    fn eq(&self, a: StrRef, b: StrRef) -> Result<bool, RuntimeError> {
        Ok(self.str_text(a)? == self.str_text(b)?)
    }

    fn cmp(&self, a: StrRef, b: StrRef) -> Result<Ordering, RuntimeError> {
        Ok(self.str_text(a)?.cmp(self.str_text(b)?))
    }

    fn concat(&mut self, a: StrRef, b: StrRef) -> Result<StrRef, RuntimeError> {
        let joined = format!("{}{}", self.str_text(a)?, self.str_text(b)?);
        Ok(self.intern(joined))
    }

    fn repeat(&mut self, s: StrRef, count: i64) -> Result<StrRef, RuntimeError> {
        let count = usize::try_from(count).map_err(|_| AdhocError::new("negative repeat count"))?;
        let repeated = self.str_text(s)?.repeat(count);
        Ok(self.intern(repeated))
    }

    fn substr(&mut self, s: StrRef, start: i64, len: i64) -> Result<StrRef, RuntimeError> {
        let text = self.str_text(s)?;
        let chars: Vec<char> = text.chars().collect();
        let start = usize::try_from(start).map_err(|_| AdhocError::new("negative substr start"))?;
        let len = usize::try_from(len).map_err(|_| AdhocError::new("negative substr length"))?;
        let end = (start + len).min(chars.len());
        let start = start.min(chars.len());
        let slice: String = chars[start..end].iter().collect();
        Ok(self.intern(slice))
    }

    fn index(&self, haystack: StrRef, needle: StrRef, start: i64) -> Result<i64, RuntimeError> {
        let h = self.str_text(haystack)?;
        let n = self.str_text(needle)?;
        let start = usize::try_from(start).unwrap_or(0).min(h.len());
        Ok(h[start..]
            .find(n)
            .map(|p| (p + start) as i64)
            .unwrap_or(-1))
    }

    fn rindex(&self, haystack: StrRef, needle: StrRef, start: i64) -> Result<i64, RuntimeError> {
        let h = self.str_text(haystack)?;
        let n = self.str_text(needle)?;
        let bound = usize::try_from(start).unwrap_or(h.len()).min(h.len());
        Ok(h[..bound].rfind(n).map(|p| p as i64).unwrap_or(-1))
    }

    fn uc(&mut self, s: StrRef) -> Result<StrRef, RuntimeError> {
        let upper = self.str_text(s)?.to_uppercase();
        Ok(self.intern(upper))
    }

    fn lc(&mut self, s: StrRef) -> Result<StrRef, RuntimeError> {
        let lower = self.str_text(s)?.to_lowercase();
        Ok(self.intern(lower))
    }

    fn tc(&mut self, s: StrRef) -> Result<StrRef, RuntimeError> {
        let text = self.str_text(s)?;
        let mut chars = text.chars();
        let titled = match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };
        Ok(self.intern(titled))
    }

    fn flip(&mut self, s: StrRef) -> Result<StrRef, RuntimeError> {
        let reversed: String = self.str_text(s)?.chars().rev().collect();
        Ok(self.intern(reversed))
    }

    fn graphs(&self, s: StrRef) -> Result<i64, RuntimeError> {
        Ok(self.str_text(s)?.chars().count() as i64)
    }

    fn graph_at(&mut self, s: StrRef, index: i64) -> Result<StrRef, RuntimeError> {
        let idx = usize::try_from(index).map_err(|_| AdhocError::new("negative graph index"))?;
        let ch = self
            .str_text(s)?
            .chars()
            .nth(idx)
            .ok_or_else(|| AdhocError::new("graph index out of bounds"))?;
        Ok(self.intern(ch.to_string()))
    }

    fn from_table(&mut self, table_index: u32) -> Result<StrRef, RuntimeError> {
        let s = self
            .const_table
            .get(table_index as usize)
            .cloned()
            .ok_or_else(|| AdhocError::new("string table index out of range"))?;
        Ok(self.intern(s))
    }
}

impl BigIntEngine for ArenaHeap {
    fn add(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        self.bigint.add(a, b)
    }

    fn sub(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        self.bigint.sub(a, b)
    }

    fn mul(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        self.bigint.mul(a, b)
    }

    fn div(&self, a: &BigIntVal, b: &BigIntVal) -> Result<BigIntVal, RuntimeError> {
        self.bigint.div(a, b)
    }

    fn cmp(&self, a: &BigIntVal, b: &BigIntVal) -> Result<Ordering, RuntimeError> {
        self.bigint.cmp(a, b)
    }
}

impl NativeCallBridge for ArenaHeap {
    fn build_site(&mut self, _signature: &str) -> Result<u32, RuntimeError> {
        Err(AdhocError::new("no native library loaded").into())
    }

    fn invoke(&mut self, _site: u32, _args: &[crate::register::Register]) -> Result<crate::register::Register, RuntimeError> {
        Err(AdhocError::new("no native library loaded").into())
    }

    fn refresh_site(&mut self, _site: u32) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn extension_entry(&self, _index: u16) -> ExtensionEntry {
        fn noop(_a: &mut dyn NativeAccess, _r0: u16, _r1: u16, _r2: u16, _r3: u16) -> Result<(), RuntimeError> {
            Ok(())
        }
        let callback: ExtensionFn = noop;
        ExtensionEntry {
            callback,
            operand_byte_len: 8,
        }
    }
}

impl Profiler for ArenaHeap {
    fn enter(&mut self, _frame_id: u32) {}
    fn exit(&mut self, _frame_id: u32) {}
    fn allocated(&mut self, _at: ProfileLocation, _bytes: u64) {}
    fn replaced(&mut self, _at: ProfileLocation) {}
}
