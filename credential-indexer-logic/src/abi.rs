use alloy::sol;

sol! {
    /// Events emitted by the soulbound credential contract.
    interface ICredentialSbt {
        #[derive(Debug, PartialEq, Eq)]
        event CredentialIssued(
            uint256 indexed tokenId,
            address indexed issuer,
            address indexed subject,
            string cid
        );

        #[derive(Debug, PartialEq, Eq)]
        event CredentialRevoked(uint256 indexed tokenId, address indexed issuer);
    }
}
