//! Total order over values
//!
//! null < false < true < numbers < strings < arrays < objects. Objects compare
//! by their sorted key lists first, then by the values under those keys.

use crate::executor::types::Val;
use std::cmp::Ordering;

fn rank(v: &Val) -> u8 {
    match v {
        Val::Null => 0,
        Val::Bool(false) => 1,
        Val::Bool(true) => 2,
        Val::Int(_) | Val::Num(_) => 3,
        Val::Str(_) => 4,
        Val::List(_) | Val::Cursor(_) => 5,
        Val::Obj(_) => 6,
        Val::Error(_) => 7,
    }
}

fn items(v: &Val) -> &[Val] {
    match v {
        Val::List(items) => items,
        Val::Cursor(cursor) => cursor.remaining(),
        _ => &[],
    }
}

pub fn compare(a: &Val, b: &Val) -> Ordering {
    let (ra, rb) = (rank(a), rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }

    match (a, b) {
        (Val::Int(x), Val::Int(y)) => x.cmp(y),
        (Val::Str(x), Val::Str(y)) => x.cmp(y),
        (Val::Obj(x), Val::Obj(y)) => x
            .keys()
            .cmp(y.keys())
            .then_with(|| {
                x.values()
                    .zip(y.values())
                    .map(|(l, r)| compare(l, r))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
        (Val::Error(x), Val::Error(y)) => x.message.cmp(&y.message),
        _ if ra == 3 => {
            let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ if ra == 5 => {
            let (xs, ys) = (items(a), items(b));
            xs.iter()
                .zip(ys)
                .map(|(l, r)| compare(l, r))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| xs.len().cmp(&ys.len()))
        }
        _ => Ordering::Equal,
    }
}
