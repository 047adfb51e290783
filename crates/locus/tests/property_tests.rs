//! Property tests for the locator grammar and node composition

#![allow(clippy::unwrap_used)]

use std::fmt::Display;

use locus::locator::{ParsedLocator, Strategy};
use locus::node::LocatorNode;
use proptest::prelude::*;
use proptest::sample::select;

proptest! {
    #[test]
    fn prop_prefixed_locator_parses_to_parts(
        strategy in select(Strategy::ALL.to_vec()),
        body in "[a-z#.][a-z0-9 ._#-]{0,16}[a-z0-9]",
    ) {
        let input = format!("{}={}", strategy.keyword(), body);
        let parsed = ParsedLocator::parse(&input).unwrap();
        prop_assert_eq!(parsed.strategy, strategy);
        prop_assert_eq!(&parsed.body, &body);
        prop_assert_eq!(parsed.to_string(), input);
    }

    #[test]
    fn prop_unprefixed_is_whole_xpath(
        tag in "[a-z]{1,8}",
        attr in "[a-z]{1,5}",
        value in "[a-z0-9]{0,6}",
    ) {
        let input = format!("//{tag}[@{attr}='{value}']");
        let parsed = ParsedLocator::parse(&input).unwrap();
        prop_assert_eq!(parsed.strategy, Strategy::XPath);
        prop_assert_eq!(parsed.body, input);
    }

    #[test]
    fn prop_latest_binding_wins(
        bindings in proptest::collection::vec((0usize..500, "[a-z]{1,6}"), 1..6),
    ) {
        let node = LocatorNode::new("//tr[%d]/td[@data-col='%s']").unwrap();
        for (row, col) in &bindings {
            node.bind(&[row as &dyn Display, col]).unwrap();
        }
        let (row, col) = bindings.last().unwrap();
        prop_assert_eq!(
            node.locator().unwrap().body,
            format!("//tr[{row}]/td[@data-col='{col}']")
        );
        prop_assert_eq!(
            node.raw_template().unwrap(),
            "//tr[%d]/td[@data-col='%s']"
        );
    }

    #[test]
    fn prop_xpath_chain_concatenates_segments(
        tags in proptest::collection::vec("[a-z]{1,6}", 1..5),
    ) {
        let mut node = LocatorNode::new("//main").unwrap();
        for tag in &tags {
            node = node.child(&format!(".//{tag}")).unwrap();
        }
        let expected: String = std::iter::once("//main".to_string())
            .chain(tags.iter().map(|t| format!("//{t}")))
            .collect();
        let full = node.full_locator().unwrap();
        prop_assert_eq!(full.strategy, Strategy::XPath);
        prop_assert_eq!(full.body, expected);
    }

    #[test]
    fn prop_css_chain_joins_with_space(
        classes in proptest::collection::vec("[a-z]{1,6}", 1..5),
    ) {
        let mut node = LocatorNode::new("css=#app").unwrap();
        for class in &classes {
            node = node.child(&format!("css=.{class}")).unwrap();
        }
        let expected = std::iter::once("#app".to_string())
            .chain(classes.iter().map(|c| format!(".{c}")))
            .collect::<Vec<_>>()
            .join(" ");
        let full = node.full_locator().unwrap();
        prop_assert_eq!(full.strategy, Strategy::Css);
        prop_assert_eq!(full.body, expected);
    }

    #[test]
    fn prop_attribute_strategies_expand_to_xpath(value in "[a-z0-9_-]{1,12}") {
        let id = ParsedLocator::parse(&format!("id={value}")).unwrap();
        prop_assert_eq!(id.to_xpath().unwrap(), format!("//*[@id='{value}']"));
        let name = ParsedLocator::parse(&format!("name={value}")).unwrap();
        prop_assert_eq!(name.to_xpath().unwrap(), format!("//*[@name='{value}']"));
    }
}
