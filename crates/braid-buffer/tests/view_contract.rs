//! `view_contract` 集成测试：验证非占有窗口的边界、扁平化与委托语义。
//!
//! # 测试目标（Why）
//! - 窗口创建遵循“起点严格校验、终点按惯例钳制”的非对称规则，
//!   与字节访问的全检查语义形成对照，需要分别锁定；
//! - 视图之上再开视图必须按偏移相加扁平化，任何访问路径的间接
//!   层数恒为 1——该不变量只能通过行为等价性观察。
//!
//! # 结构安排（How）
//! - 窗口算术：基本窗口、终点钳制、起点越界、空窗口；
//! - 委托：读写直达分段、视图套视图、分段入口；
//! - 物化：窗口内容的拷贝隔离。

use braid_buffer::{BufPart, CompositeBuf, Segment};
use braid_core::{ByteRegion, ErrorKind};

fn sample_composite() -> (Segment, Segment, CompositeBuf) {
    let a = Segment::exclusive(vec![10, 11, 12, 13]);
    let b = Segment::exclusive(vec![14, 15, 16, 17]);
    let c = CompositeBuf::of([BufPart::from(&a), BufPart::from(&b)]).expect("组合构造不应失败");
    (a, b, c)
}

/// 基本窗口：长度与内容对应父级的逻辑子区间。
#[test]
fn subarray_exposes_logical_window() {
    let (_a, _b, c) = sample_composite();
    let v = c.subarray(2, 6).expect("窗口创建不应失败");
    assert_eq!(v.len(), 4);
    let mut probe = [0u8; 4];
    v.read_at(0, &mut probe).expect("窗口读取不应失败");
    assert_eq!(probe, [12, 13, 14, 15], "窗口应横跨两个分段");
}

/// 终点超出有效长度时钳制，不构成错误。
#[test]
fn subarray_clamps_end_beyond_length() {
    let (_a, _b, c) = sample_composite();
    let v = c.subarray(6, 100).expect("终点越界应被钳制");
    assert_eq!(v.len(), 2);
    let mut probe = [0u8; 2];
    v.read_at(0, &mut probe).expect("钳制窗口读取不应失败");
    assert_eq!(probe, [16, 17]);
}

/// 起点严格大于有效长度时拒绝创建。
#[test]
fn subarray_rejects_start_beyond_length() {
    let (_a, _b, c) = sample_composite();
    let err = c.subarray(9, 10).expect_err("起点越界应失败");
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    assert_eq!(err.code(), braid_core::codes::OUT_OF_RANGE);

    let boundary = c.subarray(8, 8).expect("起点等于长度应创建空窗口");
    assert_eq!(boundary.len(), 0);
}

/// 终点小于起点时收拢为空窗口，而非报错。
#[test]
fn subarray_collapses_inverted_range() {
    let (_a, _b, c) = sample_composite();
    let v = c.subarray(5, 2).expect("倒置范围应收拢为空窗口");
    assert_eq!(v.len(), 0);
    assert!(v.is_empty());
}

/// 视图套视图按偏移相加扁平化，行为与一步到位的窗口一致。
#[test]
fn view_of_view_flattens_to_single_indirection() {
    let (_a, _b, c) = sample_composite();
    let outer = c.subarray(1, 7).expect("外层窗口创建不应失败");
    let inner = outer.subarray(2, 5).expect("内层窗口创建不应失败");
    let direct = c.subarray(3, 6).expect("对照窗口创建不应失败");

    assert_eq!(inner.len(), direct.len());
    let mut via_nested = [0u8; 3];
    inner.read_at(0, &mut via_nested).expect("嵌套窗口读取不应失败");
    let mut via_direct = [0u8; 3];
    direct.read_at(0, &mut via_direct).expect("对照窗口读取不应失败");
    assert_eq!(via_nested, via_direct);

    let spliced = CompositeBuf::of([BufPart::from(inner)]).expect("嵌套窗口应可拼入组合");
    assert_eq!(
        spliced.to_vec().expect("拼接结果读取不应失败"),
        vec![13, 14, 15]
    );
}

/// 经视图写入直达底层分段，父组合与外部持有者同步可见。
#[test]
fn view_writes_reach_underlying_segments() {
    let (a, _b, c) = sample_composite();
    let v = c.subarray(0, 4).expect("窗口创建不应失败");
    v.write_at(1, &[99]).expect("窗口写入不应失败");

    let mut via_parent = [0u8; 1];
    c.read_at(1, &mut via_parent).expect("父组合读取不应失败");
    assert_eq!(via_parent, [99]);
    let mut via_segment = [0u8; 1];
    a.read_at(1, &mut via_segment).expect("分段读取不应失败");
    assert_eq!(via_segment, [99]);
}

/// 窗口内的字节访问越界时报告稳定错误码。
#[test]
fn view_byte_access_validates_window_bounds() {
    let (_a, _b, c) = sample_composite();
    let v = c.subarray(2, 5).expect("窗口创建不应失败");
    let mut dst = [0u8; 4];
    let err = v.read_at(0, &mut dst).expect_err("超出窗口的读取应失败");
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    let err = v.write_at(3, &[1]).expect_err("超出窗口的写入应失败");
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
}

/// 窗口物化得到独立拷贝，与来源彻底解耦。
#[test]
fn view_slice_is_copy_isolated() {
    let (a, _b, c) = sample_composite();
    let v = c.subarray(2, 6).expect("窗口创建不应失败");
    let s = v.slice(0, 4);
    assert_eq!(s.to_vec().expect("物化结果读取不应失败"), vec![12, 13, 14, 15]);

    a.write_at(2, &[0]).expect("来源改写不应失败");
    a.detach();
    assert!(!s.is_detached(), "物化结果不应随来源分离");
    assert_eq!(
        s.to_vec().expect("来源分离后物化结果仍应可读"),
        vec![12, 13, 14, 15]
    );
}

/// 分段入口的窗口与物化：与组合入口语义一致。
#[test]
fn segment_entry_points_share_window_semantics() {
    let a = Segment::exclusive(vec![1, 2, 3, 4, 5]);
    let v = a.subarray(1, 4).expect("分段窗口创建不应失败");
    assert_eq!(v.len(), 3);
    let mut probe = [0u8; 3];
    v.read_at(0, &mut probe).expect("分段窗口读取不应失败");
    assert_eq!(probe, [2, 3, 4]);

    let err = a.subarray(6, 7).expect_err("起点越界应失败");
    assert_eq!(err.kind(), ErrorKind::OutOfRange);

    let s = a.slice(2, 9);
    assert_eq!(s.to_vec().expect("分段物化读取不应失败"), vec![3, 4, 5]);
    assert_eq!(s.segment_count(), 1);
}

/// 视图克隆是轻量引用复制，窗口参数与可见内容一致。
#[test]
fn view_clone_shares_window() {
    let (_a, _b, c) = sample_composite();
    let v = c.subarray(2, 6).expect("窗口创建不应失败");
    let w = v.clone();
    v.write_at(0, &[42]).expect("原窗口写入不应失败");
    let mut probe = [0u8; 1];
    w.read_at(0, &mut probe).expect("克隆窗口读取不应失败");
    assert_eq!(probe, [42], "克隆窗口与原窗口观察同一存储");
}
