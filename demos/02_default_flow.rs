/// default flow - missed installment, lender seizes the collateral
use p2p_lending_rs::{
    Address, AssetId, ClaimTokenVault, CollateralOfferParams, InMemoryLedger, Ledger,
    LendingDesk, Money, ProtocolConfig, Rate, SafeTimeProvider, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== default flow ===\n");

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
    ledger.credit(gold, borrower, Money::from_major(100));

    let mut desk = LendingDesk::new(ProtocolConfig::default(), ledger);
    desk.bind(ClaimTokenVault::new())?;

    // this time the borrower leads: pledge collateral, wait for funding
    let offer_id = desk.create_collateral_offer(
        borrower,
        CollateralOfferParams {
            collateral_asset: gold,
            collateral_amount: Money::from_major(100),
            loan_asset: usd,
            loan_amount: Money::from_major(1000),
            interest: Rate::from_percentage(10),
            period_secs: 86_400,
            installment_count: 10,
            whitelist: Vec::new(),
        },
        &time,
    )?;
    let loan_id = desk.accept_collateral_offer(lender, offer_id, &time)?;
    println!("loan originated: {}", loan_id);

    // the borrower pays one installment and then stops
    controller.advance(Duration::days(1));
    desk.pay_debt(borrower, loan_id, Money::from_major(110), &time)?;
    println!("one installment paid");

    // past the second due date plus grace
    controller.advance(Duration::days(3));
    let view = desk.loan_view(loan_id, &time)?;
    println!("past due: {}", view.past_due);

    desk.claim_collateral_as_lender(lender, loan_id, &time)?;
    println!("\ncollateral seized");
    println!("lender gold balance: {}", desk.ledger.balance_of(gold, lender));
    println!("lender usd balance:  {}", desk.ledger.balance_of(usd, lender));
    println!("final status: {:?}", desk.loan(loan_id)?.status);

    Ok(())
}
