//! Built-in method bodies for Lists, Maps and Strings.
//!
//! Each function has the `NativeFn` shape `fn(&mut dyn NativeContext) -> i32`:
//! `arg(0)` is always the receiver (method-call resolution binds it there),
//! `arg(1..)` are the call's own arguments.
//! Returns follow the host contract: `-1` means an exception was raised,
//! `0` means nothing was pushed, `N>0` means `N` values were pushed.

use buzz_ir::object::{NativeContext, ObjList, ObjMap, ObjString};
use buzz_ir::value::{HashableValue, ObjRef, Value};

use crate::heap::{view, view_mut};

fn receiver(ctx: &dyn NativeContext) -> ObjRef {
    ctx.arg(0).as_obj().expect("receiver must be a heap object")
}

fn raise_out_of_bound(ctx: &mut dyn NativeContext, index: i64, detail: &str) -> i32 {
    let message = format!("{index} is out of bound: {detail}");
    let v = ctx.intern_string(&message);
    ctx.raise(v);
    -1
}

// ---- List ------------------------------------------------------------

pub fn list_append(ctx: &mut dyn NativeContext) -> i32 {
    let list_ref = receiver(ctx);
    let list: &mut ObjList = unsafe { view_mut(list_ref) };
    list.items.push(ctx.arg(1));
    ctx.mark_dirty(list_ref);
    ctx.push(ctx.arg(0));
    1
}

pub fn list_len(ctx: &mut dyn NativeContext) -> i32 {
    let list: &ObjList = unsafe { view(receiver(ctx)) };
    ctx.push(Value::Integer(list.items.len() as i64));
    1
}

pub fn list_remove(ctx: &mut dyn NativeContext) -> i32 {
    let index = match ctx.arg(1) {
        Value::Integer(i) => i,
        _ => return raise_out_of_bound(ctx, 0, "`index` must be an integer"),
    };
    let list_ref = receiver(ctx);
    let list: &mut ObjList = unsafe { view_mut(list_ref) };
    if index < 0 || index as usize >= list.items.len() {
        ctx.push(Value::Null);
        return 1;
    }
    let removed = list.items.remove(index as usize);
    ctx.mark_dirty(list_ref);
    ctx.push(removed);
    1
}

pub fn list_sub(ctx: &mut dyn NativeContext) -> i32 {
    let start = match ctx.arg(1) {
        Value::Integer(i) => i,
        _ => return raise_out_of_bound(ctx, 0, "`start` must be an integer"),
    };
    let list: &ObjList = unsafe { view(receiver(ctx)) };
    if start < 0 || start as usize > list.items.len() {
        return raise_out_of_bound(ctx, start, "`start` is out of bound");
    }
    let len = match ctx.arg(2) {
        Value::Integer(n) => n as usize,
        Value::Null => list.items.len() - start as usize,
        _ => return raise_out_of_bound(ctx, 0, "`len` must be an integer"),
    };
    let end = (start as usize + len).min(list.items.len());
    let slice = list.items[start as usize..end].to_vec();
    let item_type = list.item_type.clone();
    let new_list = ctx.alloc_list(item_type, slice);
    ctx.push(new_list);
    1
}

pub fn list_index_of(ctx: &mut dyn NativeContext) -> i32 {
    let needle = ctx.arg(1);
    let list: &ObjList = unsafe { view(receiver(ctx)) };
    let found = list
        .items
        .iter()
        .position(|v| buzz_ir::dispatch::eql(v, &needle));
    match found {
        Some(i) => ctx.push(Value::Integer(i as i64)),
        None => ctx.push(Value::Null),
    }
    1
}

pub fn list_join(ctx: &mut dyn NativeContext) -> i32 {
    let sep_ref = match ctx.arg(1).as_obj() {
        Some(o) => o,
        None => return raise_out_of_bound(ctx, 0, "`sep` must be a string"),
    };
    let sep: &ObjString = unsafe { view(sep_ref) };
    let sep_text = buzz_ir::intern::text(sep.value);

    let list: &ObjList = unsafe { view(receiver(ctx)) };
    let mut parts = Vec::with_capacity(list.items.len());
    for item in &list.items {
        match item.as_obj() {
            Some(o) => {
                let s: &ObjString = unsafe { view(o) };
                parts.push(buzz_ir::intern::text(s.value));
            }
            None => parts.push(format_scalar(*item)),
        }
    }
    let joined = parts.join(&sep_text);
    let result = ctx.intern_string(&joined);
    ctx.push(result);
    1
}

/// Iterator protocol (`next(k?) > num?`): given the
/// previous index (or `null` to start), returns the next valid index.
pub fn list_next(ctx: &mut dyn NativeContext) -> i32 {
    let list: &ObjList = unsafe { view(receiver(ctx)) };
    let next_index = match ctx.arg(1) {
        Value::Null => 0usize,
        Value::Integer(k) => (k + 1) as usize,
        _ => return raise_out_of_bound(ctx, 0, "`k` must be an integer or null"),
    };
    if next_index < list.items.len() {
        ctx.push(Value::Integer(next_index as i64));
    } else {
        ctx.push(Value::Null);
    }
    1
}

// ---- Map ---------------------------------------------------------------

pub fn map_size(ctx: &mut dyn NativeContext) -> i32 {
    let map: &ObjMap = unsafe { view(receiver(ctx)) };
    ctx.push(Value::Integer(map.entries.len() as i64));
    1
}

pub fn map_remove(ctx: &mut dyn NativeContext) -> i32 {
    let key = match ctx.arg(1).as_hashable() {
        Some(k) => k,
        None => {
            ctx.push(Value::Null);
            return 1;
        }
    };
    let map_ref = receiver(ctx);
    let map: &mut ObjMap = unsafe { view_mut(map_ref) };
    if let Some(pos) = map.entries.iter().position(|(k, _)| *k == key) {
        let (_, v) = map.entries.remove(pos);
        ctx.mark_dirty(map_ref);
        ctx.push(v);
    } else {
        ctx.push(Value::Null);
    }
    1
}

pub fn map_keys(ctx: &mut dyn NativeContext) -> i32 {
    let map: &ObjMap = unsafe { view(receiver(ctx)) };
    let keys = map.entries.iter().map(|(k, _)| hashable_to_value(*k)).collect();
    let key_type = map.key_type.clone();
    let list = ctx.alloc_list(key_type, keys);
    ctx.push(list);
    1
}

pub fn map_values(ctx: &mut dyn NativeContext) -> i32 {
    let map: &ObjMap = unsafe { view(receiver(ctx)) };
    let values: Vec<Value> = map.entries.iter().map(|(_, v)| *v).collect();
    let value_type = map.value_type.clone();
    let list = ctx.alloc_list(value_type, values);
    ctx.push(list);
    1
}

/// `rawNext(prev?) > K?`: keys in insertion order.
pub fn map_raw_next(ctx: &mut dyn NativeContext) -> i32 {
    let map: &ObjMap = unsafe { view(receiver(ctx)) };
    let prev = ctx.arg(1).as_hashable();
    let next = match prev {
        None => map.entries.first(),
        Some(k) => {
            let pos = map.entries.iter().position(|(ek, _)| *ek == k);
            pos.and_then(|i| map.entries.get(i + 1))
        }
    };
    match next {
        Some((k, _)) => ctx.push(hashable_to_value(*k)),
        None => ctx.push(Value::Null),
    }
    1
}

fn hashable_to_value(h: HashableValue) -> Value {
    match h {
        HashableValue::Null => Value::Null,
        HashableValue::Boolean(b) => Value::Boolean(b),
        HashableValue::Integer(i) => Value::Integer(i),
        HashableValue::Float(bits) => Value::Float(f64::from_bits(bits)),
        HashableValue::Obj(o) => Value::Obj(o),
    }
}

fn format_scalar(v: Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Obj(_) => String::new(),
    }
}

// ---- String --------------------------------------------------------------

pub fn string_sub(ctx: &mut dyn NativeContext) -> i32 {
    let start = match ctx.arg(1) {
        Value::Integer(i) => i,
        _ => return raise_out_of_bound(ctx, 0, "`start` must be an integer"),
    };
    let s: &ObjString = unsafe { view(receiver(ctx)) };
    let text = buzz_ir::intern::text(s.value);
    let chars: Vec<char> = text.chars().collect();
    if start < 0 || start as usize > chars.len() {
        return raise_out_of_bound(ctx, start, "`start` is out of bound");
    }
    let len = match ctx.arg(2) {
        Value::Integer(n) => n as usize,
        Value::Null => chars.len() - start as usize,
        _ => return raise_out_of_bound(ctx, 0, "`len` must be an integer"),
    };
    let end = (start as usize + len).min(chars.len());
    let slice: String = chars[start as usize..end].iter().collect();
    let result = ctx.intern_string(&slice);
    ctx.push(result);
    1
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub fn string_encode_base64(ctx: &mut dyn NativeContext) -> i32 {
    let s: &ObjString = unsafe { view(receiver(ctx)) };
    let bytes = buzz_ir::intern::text(s.value).into_bytes();
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(BASE64_ALPHABET[(b0 >> 2) as usize] as char);
        out.push(BASE64_ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            BASE64_ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64_ALPHABET[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    let result = ctx.intern_string(&out);
    ctx.push(result);
    1
}

pub fn string_decode_base64(ctx: &mut dyn NativeContext) -> i32 {
    let s: &ObjString = unsafe { view(receiver(ctx)) };
    let text = buzz_ir::intern::text(s.value);
    let mut bytes = Vec::with_capacity(text.len() / 4 * 3);
    let mut buf = [0u8; 4];
    let mut buf_len = 0usize;
    for c in text.bytes() {
        if c == b'=' {
            break;
        }
        let value = match BASE64_ALPHABET.iter().position(|&b| b == c) {
            Some(v) => v as u8,
            None => continue,
        };
        buf[buf_len] = value;
        buf_len += 1;
        if buf_len == 4 {
            bytes.push((buf[0] << 2) | (buf[1] >> 4));
            bytes.push((buf[1] << 4) | (buf[2] >> 2));
            bytes.push((buf[2] << 6) | buf[3]);
            buf_len = 0;
        }
    }
    if buf_len >= 2 {
        bytes.push((buf[0] << 2) | (buf[1] >> 4));
    }
    if buf_len >= 3 {
        bytes.push((buf[1] << 4) | (buf[2] >> 2));
    }
    let decoded = String::from_utf8_lossy(&bytes).into_owned();
    let result = ctx.intern_string(&decoded);
    ctx.push(result);
    1
}
