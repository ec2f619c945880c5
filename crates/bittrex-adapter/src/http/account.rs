/*
[INPUT]:  Currency identifiers and withdrawal parameters
[OUTPUT]: Account data (balances, deposit addresses, order detail, withdrawals)
[POS]:    HTTP layer - account endpoints (require auth + signed URI)
[UPDATE]: When adding new account endpoints or changing query parameters
*/

use crate::http::client::{BittrexClient, require_identifier, require_positive};
use crate::http::error::Result;
use crate::types::{
    AccountBalance, ApiRequest, DepositAddress, Order, WithdrawRequest, WithdrawalReceipt,
};

impl BittrexClient {
    /// Balances for every currency in the account
    ///
    /// GET /account/getbalances
    pub async fn get_balances(&self) -> Result<Vec<AccountBalance>> {
        self.execute(ApiRequest::account("account/getbalances", Vec::new()))
            .await
    }

    /// Balance for one currency
    ///
    /// GET /account/getbalance?currency={currency}
    pub async fn get_balance(&self, currency: &str) -> Result<AccountBalance> {
        require_identifier(currency, "currency")?;
        let request = ApiRequest::account(
            "account/getbalance",
            vec![("currency".to_string(), currency.to_string())],
        );
        self.execute(request).await
    }

    /// Deposit address for one currency
    ///
    /// GET /account/getdepositaddress?currency={currency}
    pub async fn get_deposit_address(&self, currency: &str) -> Result<DepositAddress> {
        require_identifier(currency, "currency")?;
        let request = ApiRequest::account(
            "account/getdepositaddress",
            vec![("currency".to_string(), currency.to_string())],
        );
        self.execute(request).await
    }

    /// Move funds out to an external address.
    ///
    /// GET /account/withdraw?currency={currency}&quantity={quantity}&address={address}
    /// Non-idempotent: a timeout here is reported with its effect unknown.
    pub async fn withdraw(&self, req: WithdrawRequest) -> Result<WithdrawalReceipt> {
        require_identifier(&req.currency, "currency")?;
        require_positive(req.quantity, "quantity")?;
        require_identifier(&req.address, "address")?;

        let mut params = vec![
            ("currency".to_string(), req.currency.clone()),
            ("quantity".to_string(), req.quantity.to_string()),
            ("address".to_string(), req.address.clone()),
        ];
        if let Some(payment_id) = &req.payment_id {
            params.push(("paymentid".to_string(), payment_id.clone()));
        }

        self.execute(ApiRequest::account("account/withdraw", params).non_idempotent())
            .await
    }

    /// Detail for one order, open or closed
    ///
    /// GET /account/getorder?uuid={uuid}
    pub async fn get_order(&self, order_uuid: &str) -> Result<Order> {
        require_identifier(order_uuid, "order uuid")?;
        let request = ApiRequest::account(
            "account/getorder",
            vec![("uuid".to_string(), order_uuid.to_string())],
        );
        self.execute(request).await
    }
}
