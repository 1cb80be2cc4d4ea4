//! Enum matcher. Values are paired by number only, so a renumbered value
//! shows up as a removal plus an addition.

use crate::compat::context::CompareContext;
use crate::compat::types::{Finding, FindingCategory};
use crate::compat::{compare_comments, paired, short_name};
use crate::model::{Enum, EnumValue};

pub fn compare_enum(original: Option<&Enum<'_>>, update: Option<&Enum<'_>>, cx: &mut CompareContext) {
    match (original, update) {
        (None, None) => {}
        (None, Some(update)) => cx.emit(Finding::new(
            FindingCategory::EnumAddition,
            &update.location(),
            update.name(),
        )),
        (Some(original), None) => cx.emit(Finding::new(
            FindingCategory::EnumRemoval,
            &original.location(),
            original.name(),
        )),
        (Some(original), Some(update)) => {
            compare_comments(&original.location(), &update.location(), update.name(), None, cx);
            for (before, after) in paired(original.values(), update.values()) {
                compare_enum_value(before, after, cx);
            }
        }
    }
}

fn compare_enum_value(
    original: Option<&EnumValue<'_>>,
    update: Option<&EnumValue<'_>>,
    cx: &mut CompareContext,
) {
    match (original, update) {
        (None, None) => {}
        (None, Some(update)) => cx.emit(
            Finding::new(FindingCategory::EnumValueAddition, &update.location(), update.name())
                .with_context(short_name(update.enum_name())),
        ),
        (Some(original), None) => cx.emit(
            Finding::new(FindingCategory::EnumValueRemoval, &original.location(), original.name())
                .with_context(short_name(original.enum_name())),
        ),
        (Some(original), Some(update)) => {
            let context = short_name(update.enum_name());
            if original.name() != update.name() {
                cx.emit(
                    Finding::new(FindingCategory::EnumValueNameChange, &update.location(), update.name())
                        .with_oldsubject(original.name())
                        .with_context(context),
                );
            }
            compare_comments(
                &original.location(),
                &update.location(),
                update.name(),
                Some(context),
                cx,
            );
        }
    }
}
