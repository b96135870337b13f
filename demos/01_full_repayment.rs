/// full repayment - pay every installment, settle both legs
use p2p_lending_rs::{
    Address, AssetId, ClaimTokenVault, InMemoryLedger, LenderOfferParams, LendingDesk, Money,
    ProtocolConfig, Rate, SafeTimeProvider, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== full repayment ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let lender = Address::generate();
    let borrower = Address::generate();
    let usd = AssetId::generate();
    let gold = AssetId::generate();

    let mut ledger = InMemoryLedger::new();
    ledger.credit(usd, lender, Money::from_major(1_000));
    ledger.credit(usd, borrower, Money::from_major(100)); // covers the interest
    ledger.credit(gold, borrower, Money::from_major(100));

    let mut desk = LendingDesk::new(ProtocolConfig::default(), ledger);
    desk.bind(ClaimTokenVault::new())?;

    let offer_id = desk.create_lender_offer(
        lender,
        LenderOfferParams {
            lend_asset: usd,
            lend_amount: Money::from_major(1000),
            collateral_assets: vec![gold],
            collateral_amounts: vec![Money::from_major(100)],
            interest: Rate::from_percentage(10),
            period_secs: 86_400,
            installment_count: 10,
            whitelist: Vec::new(),
        },
        &time,
    )?;
    let loan_id = desk.accept_lender_offer(borrower, offer_id, gold, Money::from_major(100), &time)?;

    // pay 110 usd each day
    for i in 1..=10 {
        controller.advance(Duration::days(1));
        desk.pay_debt(borrower, loan_id, Money::from_major(110), &time)?;
        println!("installment {} paid on {}", i, time.now().format("%Y-%m-%d"));
    }

    let loan = desk.loan(loan_id)?;
    println!("\nloan status: {:?}", loan.status);

    // borrower takes the collateral back, lender withdraws the proceeds
    desk.claim_collateral_as_borrower(borrower, loan_id, &time)?;
    let proceeds = desk.claim_debt(lender, loan_id, &time)?;
    println!("collateral returned, lender collected {}", proceeds);
    println!("final status: {:?}", desk.loan(loan_id)?.status);

    Ok(())
}
