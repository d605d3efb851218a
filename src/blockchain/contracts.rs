// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract bindings for the fractional NFT (PXA) and the payment token (PXC).

use alloy::sol;

sol! {
    /// Fractional-ownership ERC-721. Each token is held in weight shares of 100.
    #[sol(rpc)]
    interface IFractionalNft {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
        event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
        event ApprovalForAll(address indexed owner, address indexed operator, bool approved);

        function uploadMint(address to, uint256 tokenId) external;
        function approve(address to, uint256 tokenId) external;
        function setApprovalForAll(address operator, bool approved) external;
        function partTransferFrom(address from, address to, uint256 tokenId, uint256 weight, uint256 price) external;
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

sol! {
    /// ERC-20 payment token with an owner-only mint.
    #[sol(rpc)]
    interface IPaymentToken {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }
}
