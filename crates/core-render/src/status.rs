//! Banner line composition.
//!
//! Format: `Every <ms> ms, style '<policy>', heuristic '<name>', diff <on|off>: <cmds>`
//! followed by ` [drop-zero]` when zero-valued lines are being suppressed.
//!
//! Two stages, as with any status line: `compose_banner` yields ordered
//! segments and `format_banner` renders them. Tests assert the exact string.

use crate::policy::DisplayPolicy;
use core_text::Heuristic;
use std::time::Duration;

pub struct BannerContext<'a> {
    pub interval: Duration,
    pub policy: DisplayPolicy,
    pub heuristic: Heuristic,
    pub diff_mode: bool,
    pub drop_zero: bool,
    pub commands: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerSegment<'a> {
    Interval(u128),
    Policy(&'static str),
    Heuristic(&'static str),
    Diff(bool),
    Commands(&'a [String]),
    DropZero,
}

pub fn compose_banner<'a>(ctx: &BannerContext<'a>) -> Vec<BannerSegment<'a>> {
    let mut segs = vec![
        BannerSegment::Interval(ctx.interval.as_millis()),
        BannerSegment::Policy(ctx.policy.name()),
        BannerSegment::Heuristic(ctx.heuristic.name()),
        BannerSegment::Diff(ctx.diff_mode),
        BannerSegment::Commands(ctx.commands),
    ];
    if ctx.drop_zero {
        segs.push(BannerSegment::DropZero);
    }
    segs
}

pub fn format_banner(segments: &[BannerSegment<'_>]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            BannerSegment::Interval(ms) => out.push_str(&format!("Every {ms} ms")),
            BannerSegment::Policy(name) => out.push_str(&format!(", style '{name}'")),
            BannerSegment::Heuristic(name) => out.push_str(&format!(", heuristic '{name}'")),
            BannerSegment::Diff(on) => out.push_str(if *on { ", diff on" } else { ", diff off" }),
            BannerSegment::Commands(cmds) => {
                out.push_str(": ");
                out.push_str(&cmds.join(" | "));
            }
            BannerSegment::DropZero => out.push_str(" [drop-zero]"),
        }
    }
    out
}

pub fn build_banner(ctx: &BannerContext<'_>) -> String {
    format_banner(&compose_banner(ctx))
}
