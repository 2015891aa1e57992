// tests/publisher.rs
use feedbook::book::{OrderBook, TopOfBook};
use feedbook::publish::{TopOfBookPublisher, CSV_HEADER};
use feedbook::wire::{Side, Symbol};

fn lines(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec())
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn header_appears_exactly_once() {
    let mut publisher = TopOfBookPublisher::new(Vec::new());
    let tob = TopOfBook::default();
    publisher.publish(1, Symbol::new("AAPL"), &tob).unwrap();
    publisher.publish(2, Symbol::new("AAPL"), &tob).unwrap();
    publisher.publish(3, Symbol::new("MSFT"), &tob).unwrap();

    let out = publisher.into_inner();
    let lines = lines(&out);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines.iter().filter(|l| l.as_str() == CSV_HEADER).count(), 1);
}

#[test]
fn both_sides_present() {
    let mut book = OrderBook::new();
    assert!(book.on_add(1, Side::Buy, 150_000_000_000, 100));
    assert!(book.on_add(2, Side::Sell, 151_250_000_000, 200));

    let mut publisher = TopOfBookPublisher::new(Vec::new());
    publisher
        .publish(42, Symbol::new("AAPL"), &book.top_of_book())
        .unwrap();

    let out = publisher.into_inner();
    let lines = lines(&out);
    assert_eq!(lines[1], "42,AAPL,150.000000000,100,151.250000000,200");
}

#[test]
fn absent_sides_become_empty_fields() {
    let mut publisher = TopOfBookPublisher::new(Vec::new());

    let bid_only = TopOfBook {
        best_bid_px: 99_500_000_000,
        bid_sz: 10,
        ..Default::default()
    };
    publisher.publish(1, Symbol::new("AAPL"), &bid_only).unwrap();

    let ask_only = TopOfBook {
        best_ask_px: 100_500_000_000,
        ask_sz: 20,
        ..Default::default()
    };
    publisher.publish(2, Symbol::new("AAPL"), &ask_only).unwrap();

    publisher
        .publish(3, Symbol::new("AAPL"), &TopOfBook::default())
        .unwrap();

    let out = publisher.into_inner();
    let lines = lines(&out);
    assert_eq!(lines[1], "1,AAPL,99.500000000,10,,");
    assert_eq!(lines[2], "2,AAPL,,,100.500000000,20");
    assert_eq!(lines[3], "3,AAPL,,,,");
}

#[test]
fn price_formatting_is_exact() {
    let cases: &[(i64, &str)] = &[
        (150_000_000_000, "150.000000000"),
        (150_500_000_000, "150.500000000"),
        (1, "0.000000001"),
        (999_999_999, "0.999999999"),
        (1_000_000_000, "1.000000000"),
        // Exceeds 2^53: a float formatter would lose the tail digits.
        (9_007_199_254_740_993, "9007199.254740993"),
        (-2_500_000_000, "-2.500000000"),
    ];

    for &(px, expected) in cases {
        let mut publisher = TopOfBookPublisher::new(Vec::new());
        let tob = TopOfBook {
            best_bid_px: px,
            bid_sz: 1,
            ..Default::default()
        };
        publisher.publish(0, Symbol::new("T"), &tob).unwrap();
        let out = publisher.into_inner();
        let lines = lines(&out);
        assert_eq!(lines[1], format!("0,T,{expected},1,,"), "px={px}");
    }
}
