//! `materialize_contract` 集成测试：验证物化（slice）的拷贝隔离与钳制语义。
//!
//! # 测试目标（Why）
//! - 物化是引擎中唯一的字节拷贝路径，调用方以此显式换取“真正连续、
//!   彻底解耦”的缓冲；隔离必须是双向的；
//! - 端点钳制与空范围语义沿用缓冲切片惯例，不构成错误——
//!   与 `subarray` 的起点严格校验形成对照。
//!
//! # 结构安排（How）
//! - 内容正确性：单段、跨段、整段物化；
//! - 钳制：越界端点、倒置范围、等点范围；
//! - 隔离：来源改写 / 分离对切片的免疫，切片改写对来源的免疫；
//! - 结果形态：单成员、独占类别。

use braid_buffer::{BufPart, CompositeBuf, Segment};
use braid_core::{ByteRegion, SegmentKind};

fn sample() -> (Segment, Segment, CompositeBuf) {
    let a = Segment::exclusive(vec![1, 2, 3, 4]);
    let b = Segment::exclusive(vec![5, 6, 7, 8]);
    let c = CompositeBuf::of([BufPart::from(&a), BufPart::from(&b)]).expect("组合构造不应失败");
    (a, b, c)
}

/// 跨段物化的内容与直接读取一致。
#[test]
fn slice_copies_requested_range() {
    let (_a, _b, c) = sample();
    let s = c.slice(2, 6);
    assert_eq!(s.len(), 4);
    assert_eq!(s.to_vec().expect("切片读取不应失败"), vec![3, 4, 5, 6]);
}

/// 整段物化等价于内容快照。
#[test]
fn full_slice_snapshots_content() {
    let (_a, _b, c) = sample();
    let s = c.slice(0, c.len());
    assert_eq!(s.to_vec().expect("快照读取不应失败"), c.to_vec().expect("原件读取不应失败"));
}

/// 端点越界被钳制，倒置与等点范围收拢为空组合，均不报错。
#[test]
fn slice_clamps_and_collapses_ranges() {
    let (_a, _b, c) = sample();
    let clamped = c.slice(6, 100);
    assert_eq!(clamped.to_vec().expect("钳制切片读取不应失败"), vec![7, 8]);

    let inverted = c.slice(5, 2);
    assert_eq!(inverted.len(), 0, "倒置范围应得到空组合");
    assert!(!inverted.is_detached());

    let empty = c.slice(3, 3);
    assert_eq!(empty.len(), 0, "等点范围应得到空组合");
    assert_eq!(empty.segment_count(), 1, "空切片仍包装一个全新分段");
}

/// 拷贝隔离：来源分离与改写均不影响已物化的切片。
#[test]
fn slice_is_isolated_from_source_mutation_and_detach() {
    let (a, _b, c) = sample();
    let s = c.slice(0, c.len());

    a.write_at(0, &[0]).expect("来源改写不应失败");
    a.detach();
    assert!(!s.is_detached(), "来源分离不得传播到切片");
    assert_eq!(
        s.to_vec().expect("来源分离后切片仍应可读"),
        vec![1, 2, 3, 4, 5, 6, 7, 8],
        "切片内容应保持物化时刻的快照"
    );
}

/// 反向隔离：改写切片不影响来源。
#[test]
fn source_is_isolated_from_slice_mutation() {
    let (a, _b, c) = sample();
    let s = c.slice(0, 4);
    s.write_at(0, &[9, 9, 9, 9]).expect("切片改写不应失败");

    let mut probe = [0u8; 4];
    a.read_at(0, &mut probe).expect("来源读取不应失败");
    assert_eq!(probe, [1, 2, 3, 4], "切片改写不得回流到来源");
}

/// 已分离句柄的物化得到空组合，不报错。
#[test]
fn slice_on_detached_composite_yields_empty() {
    let (a, _b, c) = sample();
    a.detach();
    let s = c.slice(0, 8);
    assert_eq!(s.len(), 0);
    assert!(!s.is_detached(), "空切片自身是健康的全新缓冲");
}

/// 物化结果恒为单成员独占组合，与来源类别无关。
#[test]
fn slice_result_is_single_exclusive_segment() {
    let (_a, _b, c) = sample();
    let s = c.slice(1, 7);
    assert_eq!(s.segment_count(), 1);
    assert_eq!(s.kind(), SegmentKind::Exclusive);

    let s1 = Segment::shared(vec![1, 2, 3]);
    let s2 = Segment::shared(vec![4]);
    let shared = CompositeBuf::shared_of([BufPart::from(&s1), BufPart::from(&s2)])
        .expect("共享组合构造不应失败");
    let flattened = shared.slice(0, 4);
    assert_eq!(
        flattened.kind(),
        SegmentKind::Exclusive,
        "共享来源的物化结果同样是独占分段"
    );
    assert_eq!(flattened.to_vec().expect("物化结果读取不应失败"), vec![1, 2, 3, 4]);
}

/// 多个零长成员不影响物化的范围算术。
#[test]
fn slice_walks_over_zero_length_members() {
    let a = Segment::exclusive(vec![1, 2]);
    let hole = Segment::exclusive(Vec::new());
    let b = Segment::exclusive(vec![3, 4]);
    let c = CompositeBuf::of([BufPart::from(&a), BufPart::from(&hole), BufPart::from(&b)])
        .expect("组合构造不应失败");
    let s = c.slice(1, 3);
    assert_eq!(s.to_vec().expect("切片读取不应失败"), vec![2, 3]);
}
